//! Trait definitions for the backend module.

use async_trait::async_trait;
use std::path::Path;

use super::error::BackendError;

/// An engine that converts one legacy presentation into the modern format.
///
/// Implementations must not leave a partial file at `output` when they
/// fail, and must tolerate being dropped mid-conversion (the caller enforces
/// the timeout by dropping the future).
#[async_trait]
pub trait ConversionBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Converts `input` and writes the result to `output`, replacing any
    /// existing file.
    async fn convert_one(&self, input: &Path, output: &Path) -> Result<(), BackendError>;

    /// Validates that the engine is installed and usable.
    async fn validate(&self) -> Result<(), BackendError>;

    /// How many conversions the engine can run at once, if it is limited.
    ///
    /// Callers queue excess jobs themselves so that time spent waiting for
    /// the engine does not count against a job's timeout.
    fn max_concurrency(&self) -> Option<usize> {
        None
    }

    /// Whether the engine can be used at all.
    async fn is_available(&self) -> bool {
        self.validate().await.is_ok()
    }
}
