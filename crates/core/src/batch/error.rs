//! Error types for the batch module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a batch before any job is dispatched.
///
/// Failures of individual files are never reported here; they are counted
/// in the batch summary.
#[derive(Debug, Error)]
pub enum BatchError {
    /// The worker count was not a positive integer.
    #[error("Worker count must be a positive integer, got {0}")]
    InvalidWorkerCount(usize),

    /// The batch directory does not exist.
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// The batch path exists but is not a directory.
    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// The conversion engine cannot be used.
    #[error("{0}")]
    BackendUnavailable(String),

    /// File discovery could not complete.
    #[error("File discovery failed: {0}")]
    Discovery(String),
}
