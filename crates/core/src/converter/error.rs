//! Error types for the converter module.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::types::FailureKind;

/// Why a single-file conversion did not produce output.
///
/// These never escape `FileConverter::convert`; they are folded into a
/// `ConversionOutcome`.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Missing file, wrong extension, or an unusable output path.
    #[error("Invalid input {path}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// The output exists and overwriting was not allowed.
    #[error("skipped: already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// The conversion engine is not installed or cannot be launched.
    #[error("{reason}")]
    BackendUnavailable { reason: String },

    /// The engine ran but failed for this file.
    #[error("Conversion failed for {path}: {reason}")]
    BackendFailure { path: PathBuf, reason: String },

    /// The engine did not finish within the per-job bound.
    #[error("Conversion of {} timed out after {}s", .path.display(), .timeout.as_secs_f64())]
    Timeout { path: PathBuf, timeout: Duration },
}

impl ConvertError {
    /// Creates an invalid input error.
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The outcome classification for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput { .. } => FailureKind::InvalidInput,
            Self::AlreadyExists { .. } => FailureKind::AlreadyExists,
            Self::BackendUnavailable { .. } => FailureKind::BackendUnavailable,
            Self::BackendFailure { .. } => FailureKind::BackendFailure,
            Self::Timeout { .. } => FailureKind::Timeout,
        }
    }
}
