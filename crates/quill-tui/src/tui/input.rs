// Keyboard and mouse input handling.
//
// Translates crossterm events into UserCommand messages for the app loop,
// or into local ViewState changes (setup modal cursor, panel selection).

use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use quill_core::layout::PointerEvent;

use super::layout::to_workspace;
use super::ViewState;
use crate::protocol::UserCommand;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app loop. Returns `None` when it was handled locally or ignored.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Windows reports releases too; only act on presses.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c')
    {
        return Some(UserCommand::Quit);
    }

    if view_state.setup.is_some() {
        return handle_setup_key(key_event, view_state);
    }

    match key_event.code {
        KeyCode::Char(c @ '1'..='9') => {
            let index = c as usize - '1' as usize;
            view_state
                .layout
                .sections
                .get(index)
                .map(|(id, _)| UserCommand::SwitchSection(id.clone()))
        }
        KeyCode::Char('e') => Some(UserCommand::ToggleEditor),
        KeyCode::Char('v') => Some(UserCommand::CycleViewMode),
        KeyCode::Tab => Some(UserCommand::CycleFocus),
        KeyCode::Char('u') => Some(UserCommand::RevertLayout),
        KeyCode::Char(']') => {
            move_panel_cursor(view_state, 1);
            None
        }
        KeyCode::Char('[') => {
            move_panel_cursor(view_state, -1);
            None
        }
        KeyCode::Char(' ') => view_state
            .selected_panel()
            .map(|p| UserCommand::TogglePanel(p.id.clone())),
        KeyCode::Char('q') => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Keys while the setup modal is open. Everything else is blocked.
fn handle_setup_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let modal = view_state.setup.as_mut()?;
    let count = modal.prompt.choices.len();
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            modal.cursor = modal.cursor.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if modal.cursor + 1 < count {
                modal.cursor += 1;
            }
            None
        }
        KeyCode::Char(' ') => {
            let cursor = modal.cursor;
            modal.prompt.toggle(cursor);
            None
        }
        KeyCode::Enter => {
            let modal = view_state.setup.take()?;
            Some(UserCommand::CompleteSetup {
                section: modal.prompt.section.clone(),
                selected: modal.prompt.selected_ids(),
            })
        }
        _ => None,
    }
}

fn move_panel_cursor(view_state: &mut ViewState, step: isize) {
    let count = view_state.layout.panels.len();
    if count == 0 {
        view_state.panel_cursor = 0;
        return;
    }
    let current = view_state.panel_cursor.min(count - 1) as isize;
    view_state.panel_cursor = (current + step).rem_euclid(count as isize) as usize;
}

/// Handle a mouse event. Left-button press, drag and release become pointer
/// events in workspace coordinates.
pub fn handle_mouse(mouse: MouseEvent, view_state: &ViewState) -> Option<UserCommand> {
    if view_state.setup.is_some() {
        return None;
    }
    let point = to_workspace(mouse.column, mouse.row, view_state.workspace_area);
    let event = match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => PointerEvent::Down(point),
        MouseEventKind::Drag(MouseButton::Left) => PointerEvent::Move(point),
        MouseEventKind::Up(MouseButton::Left) => PointerEvent::Up(point),
        _ => return None,
    };
    Some(UserCommand::Pointer(event))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{LayoutSnapshot, PanelView};
    use crate::tui::SetupModal;
    use crossterm::event::{KeyEventState, MouseEvent};
    use quill_core::geometry::{Point, Rect as PanelRect};
    use quill_core::layout::{SetupChoice, SetupPrompt};
    use ratatui::layout::Rect;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn panel(id: &str) -> PanelView {
        PanelView {
            id: id.into(),
            title: id.to_uppercase(),
            rect: PanelRect::new(0, 0, 10, 5),
            z: 1,
            hidden: false,
        }
    }

    fn view_state() -> ViewState {
        ViewState {
            layout: LayoutSnapshot {
                sections: vec![
                    ("writing".into(), "Writing".into()),
                    ("characters".into(), "Characters".into()),
                ],
                panels: vec![panel("a"), panel("b"), panel("c")],
                ..LayoutSnapshot::default()
            },
            workspace_area: Rect::new(0, 1, 120, 34),
            ..ViewState::default()
        }
    }

    fn with_setup(mut state: ViewState) -> ViewState {
        state.setup = Some(SetupModal {
            prompt: SetupPrompt {
                section: "plotting".into(),
                section_title: "Plotting".into(),
                choices: ["a", "b", "c"]
                    .iter()
                    .map(|id| SetupChoice {
                        id: id.to_string(),
                        title: id.to_uppercase(),
                        selected: true,
                    })
                    .collect(),
            },
            cursor: 0,
        });
        state
    }

    #[test]
    fn digits_switch_to_known_sections_only() {
        let mut state = view_state();
        assert_eq!(
            handle_key(key(KeyCode::Char('2')), &mut state),
            Some(UserCommand::SwitchSection("characters".into()))
        );
        assert_eq!(handle_key(key(KeyCode::Char('7')), &mut state), None);
    }

    #[test]
    fn layout_keys_map_to_commands() {
        let mut state = view_state();
        assert_eq!(handle_key(key(KeyCode::Char('e')), &mut state), Some(UserCommand::ToggleEditor));
        assert_eq!(handle_key(key(KeyCode::Char('v')), &mut state), Some(UserCommand::CycleViewMode));
        assert_eq!(handle_key(key(KeyCode::Tab), &mut state), Some(UserCommand::CycleFocus));
        assert_eq!(handle_key(key(KeyCode::Char('u')), &mut state), Some(UserCommand::RevertLayout));
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), Some(UserCommand::Quit));
    }

    #[test]
    fn ctrl_c_quits_even_in_setup() {
        let mut state = with_setup(view_state());
        let ctrl_c = KeyEvent {
            modifiers: KeyModifiers::CONTROL,
            ..key(KeyCode::Char('c'))
        };
        assert_eq!(handle_key(ctrl_c, &mut state), Some(UserCommand::Quit));
    }

    #[test]
    fn release_events_are_ignored() {
        let mut state = view_state();
        let release = KeyEvent {
            kind: KeyEventKind::Release,
            ..key(KeyCode::Char('q'))
        };
        assert_eq!(handle_key(release, &mut state), None);
    }

    #[test]
    fn panel_cursor_wraps_and_space_toggles_selected() {
        let mut state = view_state();
        assert_eq!(
            handle_key(key(KeyCode::Char(' ')), &mut state),
            Some(UserCommand::TogglePanel("a".into()))
        );
        handle_key(key(KeyCode::Char('[')), &mut state);
        assert_eq!(state.panel_cursor, 2);
        handle_key(key(KeyCode::Char(']')), &mut state);
        handle_key(key(KeyCode::Char(']')), &mut state);
        assert_eq!(
            handle_key(key(KeyCode::Char(' ')), &mut state),
            Some(UserCommand::TogglePanel("b".into()))
        );
    }

    #[test]
    fn setup_modal_toggles_and_confirms() {
        let mut state = with_setup(view_state());
        assert_eq!(handle_key(key(KeyCode::Down), &mut state), None);
        assert_eq!(handle_key(key(KeyCode::Char(' ')), &mut state), None);
        // Blocked while the modal is open.
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), None);

        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::CompleteSetup {
                section: "plotting".into(),
                selected: vec!["a".into(), "c".into()],
            })
        );
        assert!(state.setup.is_none());
    }

    #[test]
    fn setup_cursor_stays_in_range() {
        let mut state = with_setup(view_state());
        handle_key(key(KeyCode::Up), &mut state);
        assert_eq!(state.setup.as_ref().unwrap().cursor, 0);
        for _ in 0..10 {
            handle_key(key(KeyCode::Down), &mut state);
        }
        assert_eq!(state.setup.as_ref().unwrap().cursor, 2);
    }

    #[test]
    fn mouse_left_button_drives_pointer() {
        let state = view_state();
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 1), &state),
            Some(UserCommand::Pointer(PointerEvent::Down(Point::new(5, 0))))
        );
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 9, 4), &state),
            Some(UserCommand::Pointer(PointerEvent::Move(Point::new(9, 3))))
        );
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 0, 0), &state),
            Some(UserCommand::Pointer(PointerEvent::Up(Point::new(0, -1))))
        );
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Down(MouseButton::Right), 5, 5), &state),
            None
        );
        assert_eq!(handle_mouse(mouse(MouseEventKind::Moved, 5, 5), &state), None);
    }

    #[test]
    fn mouse_is_ignored_during_setup() {
        let state = with_setup(view_state());
        assert_eq!(
            handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 1), &state),
            None
        );
    }
}
