//! Terminal user interface
//!
//! Ratatui front end over the same API layer the CLI uses. Network calls run
//! on a backend task; each screen owns a cancellation scope for its requests.

mod app;
mod backend;
mod compose;
mod form;
mod scope;
mod ui;

pub use app::run;
