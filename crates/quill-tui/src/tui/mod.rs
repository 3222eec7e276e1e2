// Terminal UI: view state, rendering, and the input/render loop.
//
// The TUI owns a `ViewState` that mirrors the workspace. The app loop pushes
// `UiUpdate` messages over an mpsc channel; the TUI applies them and
// re-renders at ~30 fps. Mouse capture is on so panel headers can be
// dragged.

pub mod input;
pub mod layout;
pub mod widgets;

use std::time::Duration;

use crossterm::event::{DisableMouseCapture, EnableMouseCapture, Event, EventStream};
use futures_util::StreamExt;
use quill_core::layout::SetupPrompt;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::protocol::{LayoutSnapshot, PanelView, UiUpdate, UserCommand};
use layout::{build_layout, panel_area, AppLayout};
use widgets::panel::PanelFocus;

// ---------------------------------------------------------------------------
// ViewState
// ---------------------------------------------------------------------------

/// The open setup prompt plus the highlighted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupModal {
    pub prompt: SetupPrompt,
    pub cursor: usize,
}

/// TUI-local state that mirrors the workspace for rendering.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub layout: LayoutSnapshot,
    pub setup: Option<SetupModal>,
    /// Index into `layout.panels` chosen for show/hide.
    pub panel_cursor: usize,
    /// Screen area of the workspace, for mouse translation.
    pub workspace_area: Rect,
}

impl ViewState {
    pub fn selected_panel(&self) -> Option<&PanelView> {
        let count = self.layout.panels.len();
        if count == 0 {
            return None;
        }
        self.layout.panels.get(self.panel_cursor.min(count - 1))
    }
}

/// Apply a single UiUpdate to the ViewState.
fn apply_ui_update(state: &mut ViewState, update: UiUpdate) {
    match update {
        UiUpdate::Layout(layout) => {
            if layout.active_section != state.layout.active_section {
                state.panel_cursor = 0;
            }
            state.layout = *layout;
        }
        UiUpdate::SetupRequested(prompt) => {
            state.setup = Some(SetupModal { prompt, cursor: 0 });
        }
        UiUpdate::SetupClosed => {
            state.setup = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Render frame
// ---------------------------------------------------------------------------

fn render_frame(frame: &mut Frame, state: &ViewState) {
    let layout = build_layout(frame.area());

    widgets::status_bar::render(frame, layout.status_bar, state);
    render_workspace(frame, &layout, state);
    render_help_bar(frame, &layout, state);

    if let Some(modal) = &state.setup {
        widgets::setup_modal::render(frame, layout.workspace, modal);
    }
}

fn render_workspace(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let selected = state.selected_panel().map(|p| p.id.as_str());
    let dragging = state.layout.dragging.as_deref();

    for panel in state.layout.draw_order() {
        let Some(area) = panel_area(panel.rect, layout.workspace) else {
            continue;
        };
        let focus = if Some(panel.id.as_str()) == dragging {
            PanelFocus::Dragging
        } else if Some(panel.id.as_str()) == selected {
            PanelFocus::Selected
        } else {
            PanelFocus::Normal
        };
        widgets::panel::render(frame, area, panel, focus);
    }
}

fn render_help_bar(frame: &mut Frame, layout: &AppLayout, state: &ViewState) {
    let text = if state.setup.is_some() {
        " Up/Down:Move | Space:Toggle | Enter:Confirm".to_string()
    } else {
        let selected = state
            .selected_panel()
            .map(|p| {
                let verb = if p.hidden { "Show" } else { "Hide" };
                format!("{} {}", verb, p.title)
            })
            .unwrap_or_else(|| "Show/hide".to_string());
        format!(
            " q:Quit | 1-{}:Sections | Drag title:Move | Tab:Focus | [ ]:Pick | Space:{} | u:Revert | e:Editor | v:View",
            state.layout.sections.len().max(1),
            selected
        )
    };
    let paragraph = Paragraph::new(Line::from(vec![Span::styled(
        text,
        Style::default().fg(Color::White).add_modifier(Modifier::DIM),
    )]))
    .style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, layout.help_bar);
}

// ---------------------------------------------------------------------------
// Main TUI loop
// ---------------------------------------------------------------------------

/// Run the TUI event loop.
///
/// 1. Initializes the terminal and turns on mouse capture.
/// 2. Installs a panic hook to restore the terminal on crash.
/// 3. Runs an async select loop: UI updates, terminal input, render ticks.
/// 4. Restores the terminal on exit.
pub async fn run(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
) -> anyhow::Result<()> {
    // 1. Initialize terminal
    let mut terminal = ratatui::init();
    crossterm::execute!(std::io::stdout(), EnableMouseCapture)?;

    // 2. Restore the terminal before the default hook prints the panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
        ratatui::restore();
        original_hook(panic_info);
    }));

    // 3. ViewState, sized to the current terminal
    let mut view_state = ViewState::default();
    let size = terminal.size()?;
    view_state.workspace_area = build_layout(Rect::new(0, 0, size.width, size.height)).workspace;

    let mut event_stream = EventStream::new();

    let mut render_tick = tokio::time::interval(Duration::from_millis(33));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    // 4. Main loop
    loop {
        tokio::select! {
            update = ui_rx.recv() => {
                match update {
                    Some(update) => apply_ui_update(&mut view_state, update),
                    // App loop is gone
                    None => break,
                }
            }

            maybe_event = event_stream.next() => {
                let command = match maybe_event {
                    Some(Ok(Event::Key(key_event))) => input::handle_key(key_event, &mut view_state),
                    Some(Ok(Event::Mouse(mouse))) => input::handle_mouse(mouse, &view_state),
                    Some(Ok(Event::Resize(cols, rows))) => {
                        view_state.workspace_area = build_layout(Rect::new(0, 0, cols, rows)).workspace;
                        Some(UserCommand::Resize(layout::workspace_size(cols, rows)))
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        warn!("Terminal input error: {}", e);
                        break;
                    }
                    None => break,
                };
                if let Some(command) = command {
                    let quit = command == UserCommand::Quit;
                    if cmd_tx.send(command).await.is_err() {
                        debug!("App loop closed the command channel");
                        break;
                    }
                    if quit {
                        break;
                    }
                }
            }

            _ = render_tick.tick() => {
                terminal.draw(|frame| render_frame(frame, &view_state))?;
            }
        }
    }

    // 5. Restore terminal
    let _ = crossterm::execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
