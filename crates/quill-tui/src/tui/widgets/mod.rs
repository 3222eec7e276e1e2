// TUI widget modules.

pub mod panel;
pub mod setup_modal;
pub mod status_bar;
