//! Ratatui front end. [`App`] owns the screen state and routes keys to the
//! record managers; [`run_app`] drives the terminal around it.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
