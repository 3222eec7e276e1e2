// Screen layout: fixed bars around the panel workspace.
//
// +--------------------------------------------------+
// | Status Bar (1 row): section tabs, view, saved at  |
// +--------------------------------------------------+
// | Workspace (fill): free-floating panels            |
// +--------------------------------------------------+
// | Help Bar (1 row)                                  |
// +--------------------------------------------------+

use quill_core::geometry::{Point, Rect as PanelRect, Size};
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Resolved screen areas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppLayout {
    pub status_bar: Rect,
    /// Panels are positioned relative to this area's top-left corner.
    pub workspace: Rect,
    pub help_bar: Rect,
}

pub fn build_layout(area: Rect) -> AppLayout {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // status bar
            Constraint::Min(0),    // workspace
            Constraint::Length(1), // help bar
        ])
        .split(area);

    AppLayout {
        status_bar: vertical[0],
        workspace: vertical[1],
        help_bar: vertical[2],
    }
}

/// Workspace size for a terminal of `cols` x `rows`.
pub fn workspace_size(cols: u16, rows: u16) -> Size {
    let ws = build_layout(Rect::new(0, 0, cols, rows)).workspace;
    Size::new(ws.width as i32, ws.height as i32)
}

/// Terminal cell to workspace coordinates. May fall outside the workspace.
pub fn to_workspace(column: u16, row: u16, workspace: Rect) -> Point {
    Point::new(
        column as i32 - workspace.x as i32,
        row as i32 - workspace.y as i32,
    )
}

/// Screen area for a panel, cut to the workspace. `None` when nothing of
/// the panel is on screen.
pub fn panel_area(panel: PanelRect, workspace: Rect) -> Option<Rect> {
    let left = (workspace.x as i32 + panel.x).max(workspace.x as i32);
    let top = (workspace.y as i32 + panel.y).max(workspace.y as i32);
    let right = (workspace.x as i32 + panel.right()).min(workspace.right() as i32);
    let bottom = (workspace.y as i32 + panel.bottom()).min(workspace.bottom() as i32);
    if right <= left || bottom <= top {
        return None;
    }
    Some(Rect::new(
        left as u16,
        top as u16,
        (right - left) as u16,
        (bottom - top) as u16,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
