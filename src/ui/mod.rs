//! Ratatui front-end: a single verse view with three modal layers (command
//! palette, add form, edit form) stacked over it. The interaction state lives
//! in [`app::App`]; the terminal plumbing and key dispatch in [`terminal`].

mod app;
mod forms;
mod helpers;
mod palette;
mod terminal;

pub use app::App;
pub use terminal::run_app;
