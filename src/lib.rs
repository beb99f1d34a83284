/// AiM Studio - documentary production dashboard (TUI Edition)
///
/// Typed REST client for the studio backend, the shared project context and
/// the terminal UI for the projects dashboard and the research phase.

pub mod api;
pub mod config;
pub mod core;
pub mod tui;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
