// Messages between the terminal UI and the app loop.

use chrono::{DateTime, Utc};
use quill_core::geometry::{Rect, Size};
use quill_core::layout::{PointerEvent, SetupPrompt, ViewMode};
use quill_core::workspace::Workspace;

/// Commands sent from the TUI to the app loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    SwitchSection(String),
    /// Pointer input in workspace coordinates.
    Pointer(PointerEvent),
    ToggleEditor,
    CycleViewMode,
    TogglePanel(String),
    CycleFocus,
    CompleteSetup {
        section: String,
        selected: Vec<String>,
    },
    RevertLayout,
    /// The workspace area changed size. Debounced by the app loop.
    Resize(Size),
    Quit,
}

/// Updates sent from the app loop to the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Layout(Box<LayoutSnapshot>),
    SetupRequested(SetupPrompt),
    SetupClosed,
}

/// One panel as the TUI draws it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub id: String,
    pub title: String,
    pub rect: Rect,
    pub z: u32,
    pub hidden: bool,
}

/// Everything the TUI needs to draw the workspace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutSnapshot {
    /// (id, title) for every section, in tab order.
    pub sections: Vec<(String, String)>,
    pub active_section: Option<String>,
    /// The active section has a list/editor split.
    pub has_split: bool,
    pub bounds: Size,
    /// All mounted panels in insertion order, hidden ones included.
    pub panels: Vec<PanelView>,
    pub dragging: Option<String>,
    pub editor_visible: bool,
    pub view_mode: ViewMode,
    pub saved_at: Option<DateTime<Utc>>,
}

impl LayoutSnapshot {
    pub fn from_workspace(ws: &Workspace) -> Self {
        LayoutSnapshot {
            sections: ws
                .registry()
                .sections()
                .map(|t| (t.section.clone(), t.title.clone()))
                .collect(),
            active_section: ws.active_section().map(str::to_string),
            has_split: ws.active_template().is_some_and(|t| t.split.is_some()),
            bounds: ws.bounds(),
            panels: ws
                .store()
                .iter()
                .map(|p| PanelView {
                    id: p.id().to_string(),
                    title: p.title().to_string(),
                    rect: p.rect(),
                    z: p.z(),
                    hidden: p.is_hidden(),
                })
                .collect(),
            dragging: ws.drag().session().map(|s| s.panel_id.clone()),
            editor_visible: ws.editor_visible(),
            view_mode: ws.view_mode(),
            saved_at: ws.saved().saved_at,
        }
    }

    /// Visible panels, bottom of the stack first.
    pub fn draw_order(&self) -> Vec<&PanelView> {
        let mut panels: Vec<&PanelView> = self.panels.iter().filter(|p| !p.hidden).collect();
        panels.sort_by_key(|p| p.z);
        panels
    }
}
