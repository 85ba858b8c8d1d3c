//! Terminal user interface using Ratatui.

mod app;
mod backend;
mod compose;
mod help;
pub mod log_pane;
mod messages;
mod quiz;
mod ui;

pub use app::run;
