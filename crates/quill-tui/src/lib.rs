pub mod app;
pub mod protocol;
pub mod tui;
