//! Single-file conversion: validation, overwrite policy and the timed
//! backend call.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, info, info_span, Instrument};

use crate::backend::{BackendConfig, ConversionBackend};

use super::error::ConvertError;
use super::paths::{is_legacy_presentation, resolve_output_path, LEGACY_EXTENSION};
use super::types::{ConversionJob, ConversionOutcome};

/// Converts one presentation at a time through a backend.
///
/// Cheap to clone; clones share the backend. Safe to call concurrently for
/// distinct inputs. When the backend limits its concurrency, excess calls
/// wait here and their timeout only starts once the engine is theirs.
#[derive(Clone)]
pub struct FileConverter {
    backend: Arc<dyn ConversionBackend>,
    timeout: Duration,
    engine_slots: Option<Arc<Semaphore>>,
}

impl FileConverter {
    /// Creates a converter with an explicit per-job timeout.
    pub fn new(backend: Arc<dyn ConversionBackend>, timeout: Duration) -> Self {
        let engine_slots = backend
            .max_concurrency()
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        Self {
            backend,
            timeout,
            engine_slots,
        }
    }

    /// Creates a converter using the timeout from a backend config.
    pub fn from_config(backend: Arc<dyn ConversionBackend>, config: &BackendConfig) -> Self {
        Self::new(backend, config.timeout())
    }

    /// The backend conversions are delegated to.
    pub fn backend(&self) -> &Arc<dyn ConversionBackend> {
        &self.backend
    }

    /// The hard per-job bound.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fails fast when the backend cannot be used at all.
    pub async fn ensure_backend(&self) -> Result<(), ConvertError> {
        self.backend
            .validate()
            .await
            .map_err(|e| ConvertError::BackendUnavailable {
                reason: e.to_string(),
            })
    }

    /// Converts `input`, writing to `output` or the sibling `.pptx`.
    ///
    /// Never fails: every error is reported through the returned outcome.
    pub async fn convert(
        &self,
        input: &Path,
        output: Option<&Path>,
        overwrite: bool,
    ) -> ConversionOutcome {
        if let Err(e) = validate_input(input).await {
            return ConversionOutcome::failed(input, None, &e);
        }

        let output = resolve_output_path(input, output);
        match self.convert_validated(input, &output, overwrite).await {
            Ok(replaced) => ConversionOutcome::succeeded(input, &output, replaced),
            Err(e) => ConversionOutcome::failed(input, Some(&output), &e),
        }
    }

    /// Runs a prepared job.
    pub async fn run_job(&self, job: &ConversionJob) -> ConversionOutcome {
        let span = info_span!("job", id = %job.job_id);
        self.convert(&job.input_path, Some(&job.output_path), job.overwrite)
            .instrument(span)
            .await
    }

    /// Returns whether an existing output was replaced.
    async fn convert_validated(
        &self,
        input: &Path,
        output: &Path,
        overwrite: bool,
    ) -> Result<bool, ConvertError> {
        if same_file(input, output).await {
            return Err(ConvertError::invalid_input(
                input,
                "output path is the same as the input",
            ));
        }

        let exists = tokio::fs::try_exists(output).await.unwrap_or(false);
        if exists && !overwrite {
            return Err(ConvertError::AlreadyExists {
                path: output.to_path_buf(),
            });
        }
        if exists {
            info!("Replacing existing file: {}", output.display());
        }

        let _slot = match &self.engine_slots {
            Some(slots) => Some(slots.acquire().await.map_err(|_| {
                ConvertError::BackendUnavailable {
                    reason: "engine queue closed".to_string(),
                }
            })?),
            None => None,
        };

        let start = Instant::now();
        debug!(
            backend = self.backend.name(),
            input = %input.display(),
            output = %output.display(),
            "Starting conversion"
        );

        match tokio::time::timeout(self.timeout, self.backend.convert_one(input, output)).await {
            Ok(Ok(())) => {
                debug!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Conversion finished"
                );
                Ok(exists)
            }
            Ok(Err(e)) if e.is_unavailable() => Err(ConvertError::BackendUnavailable {
                reason: e.detail(),
            }),
            Ok(Err(e)) => Err(ConvertError::BackendFailure {
                path: input.to_path_buf(),
                reason: e.detail(),
            }),
            Err(_) => Err(ConvertError::Timeout {
                path: input.to_path_buf(),
                timeout: self.timeout,
            }),
        }
    }
}

async fn validate_input(input: &Path) -> Result<(), ConvertError> {
    let metadata = tokio::fs::metadata(input)
        .await
        .map_err(|_| ConvertError::invalid_input(input, "file not found"))?;

    if !metadata.is_file() {
        return Err(ConvertError::invalid_input(input, "not a regular file"));
    }
    if !is_legacy_presentation(input) {
        return Err(ConvertError::invalid_input(
            input,
            format!("not a .{} file", LEGACY_EXTENSION),
        ));
    }
    Ok(())
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (
        tokio::fs::canonicalize(a).await,
        tokio::fs::canonicalize(b).await,
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
