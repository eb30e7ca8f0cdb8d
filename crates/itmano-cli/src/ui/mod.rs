//! Terminal rendering for the CLI.

pub mod header;
pub mod prompt;

pub use header::{render_header, spawn_header_watcher};
