//! Common type definitions.
//!
//! - [`Outcome`]: what happened to a single input file
//! - [`BatchReport`]: the files written and skipped by one run

use std::path::{Path, PathBuf};

/// Result of processing one file task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Outcome {
    /// The encrypted copy was written to the output path.
    Written,

    /// The output path already existed and the user declined to overwrite it.
    Skipped,
}

/// Files touched by a batch run, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    pub fn record(&mut self, outcome: Outcome, output: &Path) {
        match outcome {
            Outcome::Written => self.written.push(output.to_path_buf()),
            Outcome::Skipped => self.skipped.push(output.to_path_buf()),
        }
    }

    /// Every recorded output with its outcome, written files first.
    pub fn entries(&self) -> impl Iterator<Item = (Outcome, &Path)> {
        let written = self.written.iter().map(|path| (Outcome::Written, path.as_path()));
        let skipped = self.skipped.iter().map(|path| (Outcome::Skipped, path.as_path()));
        written.chain(skipped)
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.written.len() + self.skipped.len()
    }
}
