//! Error types for the backend module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a conversion backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The engine executable could not be located or launched.
    #[error("Conversion engine not found: {path}")]
    EngineNotFound { path: PathBuf },

    /// The engine is installed but cannot be used on this host.
    #[error("Conversion engine unavailable: {reason}")]
    Unavailable { reason: String },

    /// The engine ran but reported failure.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The converted file could not be moved into place.
    #[error("Failed to move {from} to {destination}")]
    PlacementFailed {
        from: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// I/O error while preparing or running the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Creates a conversion failure with optional engine stderr.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Whether this error means the engine itself is missing, as opposed to
    /// a failure converting one particular file.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::EngineNotFound { .. } | Self::Unavailable { .. })
    }

    /// Full human-readable detail, including captured engine stderr.
    pub fn detail(&self) -> String {
        match self {
            Self::ConversionFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => format!("{}: {}", self, stderr.trim()),
            _ => self.to_string(),
        }
    }
}
