//! Command-line front end

pub mod commands;
pub mod ui;

pub use ui::Output;
