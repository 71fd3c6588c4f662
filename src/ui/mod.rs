//! Terminal interaction.
//!
//! - [`display`]: banner, file tables, per-file and summary lines
//! - [`progress`]: per-file progress bar for a batch
//! - [`prompt`]: password entry, overwrite questions, file picker

pub mod display;
pub mod progress;
pub mod prompt;
