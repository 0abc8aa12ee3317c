//! otactl library - exposes modules for integration tests

pub mod cli;
pub mod commands;
pub mod errors;
pub mod logging;
pub mod progress;
pub mod status_display;
pub mod terminal_format;
