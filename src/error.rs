//! Error types for the batch encryption pipeline.
//!
//! Every variant aborts the batch. Messages name the offending path where
//! there is one and never carry password material.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while preparing or running a batch.
#[derive(Error, Debug)]
pub enum Error {
    /// The input arguments resolved to no files at all.
    #[error("no input files found matching: {patterns}")]
    NoInputFiles { patterns: String },

    /// A resolved input is missing, a directory, or otherwise unreadable.
    #[error("invalid input {}: {reason}", .path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// Password and confirmation differ.
    #[error("the two passwords do not match")]
    Mismatch,

    /// Reading, writing, or creating a folder failed.
    #[error("i/o failure on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The PDF library could not load, encrypt, or serialize a document.
    #[error("pdf error in {}: {reason}", .path.display())]
    Document { path: PathBuf, reason: String },

    /// The terminal prompt failed or was interrupted.
    #[error("prompt failed: {reason}")]
    Prompt { reason: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }

    pub(crate) fn document<E: std::fmt::Display>(path: impl Into<PathBuf>) -> impl FnOnce(E) -> Self {
        let path = path.into();
        move |err| Self::Document { path, reason: err.to_string() }
    }

    pub(crate) fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput { path: path.into(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
