//! pdf-encrypt - password-protect many PDF files in one run.
//!
//! One password is asked for (twice, to confirm) and applied to every
//! resolved input. Each input is copied page by page into a new document,
//! encrypted with the standard PDF security handler, and written to the
//! output folder. The password is held in a zeroizing wrapper and wiped as
//! soon as the batch ends, whether it succeeded or not.

pub mod config;
pub mod error;
pub mod file;
pub mod pdf;
pub mod processor;
pub mod secret;
pub mod types;
pub mod ui;

pub use error::{Error, Result};
pub use processor::Batch;
