//! Scraper input and generated output on disk

mod loader;
mod writer;

pub use loader::{DocumentLoader, strip_comments};
pub use writer::save_website;
