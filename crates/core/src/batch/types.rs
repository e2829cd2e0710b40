//! Types for the batch module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::converter::ConversionOutcome;

use super::error::BatchError;

/// Default number of concurrent conversions.
pub const DEFAULT_WORKERS: usize = 10;

/// Options for a single batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Report what would happen without converting anything.
    pub dry_run: bool,
    /// Maximum number of concurrent conversions.
    pub workers: usize,
    /// Replace existing outputs instead of skipping them.
    pub overwrite_existing: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            dry_run: false,
            workers: DEFAULT_WORKERS,
            overwrite_existing: true,
        }
    }
}

impl BatchOptions {
    /// Sets recursive discovery.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the existing-output policy.
    pub fn with_overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    /// Rejects options that cannot be run.
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.workers == 0 {
            return Err(BatchError::InvalidWorkerCount(self.workers));
        }
        Ok(())
    }
}

/// Aggregate counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    /// Counts one finished job.
    pub(crate) fn record(&mut self, outcome: &ConversionOutcome) {
        if outcome.success {
            self.successful += 1;
        } else if outcome.is_skip() {
            self.skipped += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Total files accounted for.
    pub fn total(&self) -> usize {
        self.successful + self.failed + self.skipped
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} successful, {} failed, {} skipped",
            self.successful, self.failed, self.skipped
        )
    }
}

/// What a dry run would do with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannedKind {
    /// No output exists yet.
    Convert,
    /// An existing output would be replaced.
    Replace,
}

impl fmt::Display for PlannedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Convert => write!(f, "convert"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

/// A conversion a dry run would perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAction {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub action: PlannedKind,
}

/// The full result of a batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    /// Number of candidate files found.
    pub discovered: usize,
    /// Dry-run plan; empty in live mode.
    pub planned: Vec<PlannedAction>,
    /// One outcome per dispatched job, in completion order.
    pub outcomes: Vec<ConversionOutcome>,
    pub dry_run: bool,
}

impl BatchReport {
    /// Whether no job failed.
    pub fn is_success(&self) -> bool {
        !self.summary.has_failures()
    }
}
