pub mod config;
pub mod geometry;
pub mod layout;
pub mod persist;
pub mod state;
pub mod workspace;
