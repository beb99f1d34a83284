//! Terminal UI: Elm-style app loop, sidebar navigation and pages.

pub mod app;
pub mod events;
pub mod layout;
pub mod services;
pub mod sidebar;
pub mod theme;
pub mod views;
pub mod widgets;
