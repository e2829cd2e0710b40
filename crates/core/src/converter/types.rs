//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::error::ConvertError;

/// Classification of a failed conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidInput,
    /// Output already exists; a skip, not a hard error.
    AlreadyExists,
    BackendUnavailable,
    BackendFailure,
    Timeout,
    /// Unexpected fault while obtaining the outcome (e.g. a panicking worker).
    Internal,
}

/// A single unit of work for the converter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Unique job identifier, used to correlate log lines.
    pub job_id: String,
    /// The legacy presentation to convert.
    pub input_path: PathBuf,
    /// Where the converted presentation is written.
    pub output_path: PathBuf,
    /// Whether an existing output may be replaced.
    pub overwrite: bool,
}

impl ConversionJob {
    /// Creates a job with a fresh id.
    pub fn new(input_path: PathBuf, output_path: PathBuf, overwrite: bool) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            input_path,
            output_path,
            overwrite,
        }
    }
}

/// The result of converting one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOutcome {
    pub success: bool,
    pub input_path: PathBuf,
    /// `None` when the input was rejected before an output was resolved.
    pub output_path: Option<PathBuf>,
    /// Human-readable description of what happened.
    pub message: String,
    /// Set when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Whether an existing output file was replaced.
    #[serde(default)]
    pub replaced: bool,
}

impl ConversionOutcome {
    pub(crate) fn succeeded(input: &Path, output: &Path, replaced: bool) -> Self {
        let message = if replaced {
            format!(
                "Successfully converted (replaced existing file): {} → {}",
                input.display(),
                output.display()
            )
        } else {
            format!(
                "Successfully converted: {} → {}",
                input.display(),
                output.display()
            )
        };

        Self {
            success: true,
            input_path: input.to_path_buf(),
            output_path: Some(output.to_path_buf()),
            message,
            failure: None,
            replaced,
        }
    }

    pub(crate) fn failed(input: &Path, output: Option<&Path>, error: &ConvertError) -> Self {
        Self {
            success: false,
            input_path: input.to_path_buf(),
            output_path: output.map(Path::to_path_buf),
            message: error.to_string(),
            failure: Some(error.kind()),
            replaced: false,
        }
    }

    /// An outcome for a job whose result could not be obtained at all.
    pub(crate) fn internal(input: &Path, output: Option<&Path>, reason: &str) -> Self {
        Self {
            success: false,
            input_path: input.to_path_buf(),
            output_path: output.map(Path::to_path_buf),
            message: format!("Error processing {}: {}", input.display(), reason),
            failure: Some(FailureKind::Internal),
            replaced: false,
        }
    }

    /// Whether this outcome is a skip because the output already existed.
    pub fn is_skip(&self) -> bool {
        self.failure == Some(FailureKind::AlreadyExists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_ids_are_unique() {
        let a = ConversionJob::new("a.ppt".into(), "a.pptx".into(), true);
        let b = ConversionJob::new("a.ppt".into(), "a.pptx".into(), true);
        assert_ne!(a.job_id, b.job_id);
    }

    #[test]
    fn test_succeeded_message_notes_replacement() {
        let fresh = ConversionOutcome::succeeded(Path::new("a.ppt"), Path::new("a.pptx"), false);
        assert!(fresh.success);
        assert!(!fresh.message.contains("replaced"));

        let replaced = ConversionOutcome::succeeded(Path::new("a.ppt"), Path::new("a.pptx"), true);
        assert!(replaced.replaced);
        assert!(replaced.message.contains("replaced existing file"));
    }

    #[test]
    fn test_failed_outcome() {
        let err = ConvertError::AlreadyExists {
            path: PathBuf::from("a.pptx"),
        };
        let outcome = ConversionOutcome::failed(Path::new("a.ppt"), Some(Path::new("a.pptx")), &err);
        assert!(!outcome.success);
        assert!(outcome.is_skip());
        assert_eq!(outcome.message, "skipped: already exists: a.pptx");
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ConversionOutcome::internal(Path::new("a.ppt"), None, "worker panicked");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["failure"], "internal");
        assert_eq!(json["output_path"], serde_json::Value::Null);
    }
}
