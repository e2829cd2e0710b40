//! Bounded concurrent conversion of a directory.

use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::converter::{
    resolve_output_path, ConversionJob, ConversionOutcome, ConvertError, FileConverter,
};

use super::discovery::discover;
use super::error::BatchError;
use super::types::{BatchOptions, BatchReport, PlannedAction, PlannedKind};

/// Discovers legacy presentations and converts them with at most
/// `workers` conversions in flight.
///
/// The orchestrator is the only place outcomes are counted. Workers hand
/// their outcome back through the join set and never touch shared counters.
pub struct BatchOrchestrator {
    converter: FileConverter,
}

/// A file that survived the pre-filter and owns its output path.
struct Candidate {
    input: PathBuf,
    output: PathBuf,
    output_exists: bool,
}

impl BatchOrchestrator {
    pub fn new(converter: FileConverter) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &FileConverter {
        &self.converter
    }

    /// Converts every legacy presentation under `directory`.
    ///
    /// Fails only on invalid options, a bad directory or an unusable backend.
    /// Per-file failures are counted in the returned summary, whose total
    /// always equals the number of discovered files.
    pub async fn run(
        &self,
        directory: &Path,
        options: &BatchOptions,
    ) -> Result<BatchReport, BatchError> {
        options.validate()?;
        check_directory(directory).await?;

        self.converter
            .ensure_backend()
            .await
            .map_err(|e| BatchError::BackendUnavailable(e.to_string()))?;

        let discovered = discover(directory, options.recursive).await?;
        let mut report = BatchReport {
            discovered: discovered.len(),
            dry_run: options.dry_run,
            ..Default::default()
        };

        if discovered.is_empty() {
            info!("No .ppt files found in {}", directory.display());
            return Ok(report);
        }
        info!("Found {} .ppt file(s) to process", discovered.len());

        let candidates = prefilter(discovered, options.overwrite_existing, &mut report).await;

        if options.dry_run {
            report.planned = plan(candidates);
            info!(
                "[DRY RUN] {} file(s) would be converted, {} skipped, {} failed",
                report.planned.len(),
                report.summary.skipped,
                report.summary.failed
            );
            return Ok(report);
        }

        if candidates.is_empty() {
            info!("Conversion complete: {}", report.summary);
            return Ok(report);
        }

        let jobs: Vec<ConversionJob> = candidates
            .into_iter()
            .map(|c| ConversionJob::new(c.input, c.output, options.overwrite_existing))
            .collect();

        info!(
            "Converting {} file(s) using {} worker(s)...",
            jobs.len(),
            options.workers
        );

        self.dispatch(jobs, options.workers, &mut report).await;

        info!("Conversion complete: {}", report.summary);
        Ok(report)
    }

    /// Runs `jobs` with at most `workers` in flight, recording every outcome
    /// exactly once.
    async fn dispatch(&self, jobs: Vec<ConversionJob>, workers: usize, report: &mut BatchReport) {
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut pending: HashMap<String, ConversionJob> = HashMap::with_capacity(jobs.len());
        let mut tasks = JoinSet::new();

        for job in jobs {
            pending.insert(job.job_id.clone(), job.clone());
            let converter = self.converter.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(_permit) => AssertUnwindSafe(converter.run_job(&job))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| {
                            ConversionOutcome::internal(
                                &job.input_path,
                                Some(&job.output_path),
                                &panic_message(panic.as_ref()),
                            )
                        }),
                    Err(_) => ConversionOutcome::internal(
                        &job.input_path,
                        Some(&job.output_path),
                        "worker pool closed",
                    ),
                };
                (job.job_id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((job_id, outcome)) => {
                    pending.remove(&job_id);
                    record(report, outcome);
                }
                Err(e) => {
                    error!(error = %e, "Conversion task ended abnormally");
                }
            }
        }

        // Tasks that never handed back an outcome still count once.
        for job in pending.into_values() {
            let outcome = ConversionOutcome::internal(
                &job.input_path,
                Some(&job.output_path),
                "conversion task ended without a result",
            );
            record(report, outcome);
        }
    }
}

async fn check_directory(directory: &Path) -> Result<(), BatchError> {
    match tokio::fs::metadata(directory).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(BatchError::NotADirectory {
            path: directory.to_path_buf(),
        }),
        Err(_) => Err(BatchError::DirectoryNotFound {
            path: directory.to_path_buf(),
        }),
    }
}

/// Resolves each file's output and drops the files that must not run.
///
/// Files whose output already exists are skipped when overwriting is
/// disabled. Inputs differing only in extension case (`Deck.ppt` and
/// `Deck.PPT`) resolve to the same output; the first in path order keeps it
/// and every later one fails without reaching the backend.
async fn prefilter(
    mut discovered: Vec<PathBuf>,
    overwrite_existing: bool,
    report: &mut BatchReport,
) -> Vec<Candidate> {
    discovered.sort();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::with_capacity(discovered.len());
    let mut candidates = Vec::with_capacity(discovered.len());

    for input in discovered {
        let output = resolve_output_path(&input, None);
        let output_exists = tokio::fs::try_exists(&output).await.unwrap_or(false);

        if output_exists && !overwrite_existing {
            info!("Skipping {} - .pptx version already exists", input.display());
            report.summary.skipped += 1;
            continue;
        }

        if let Some(owner) = claimed.get(&output) {
            let error = ConvertError::invalid_input(
                &input,
                format!(
                    "output {} is also the target of {}",
                    output.display(),
                    owner.display()
                ),
            );
            record(report, ConversionOutcome::failed(&input, Some(&output), &error));
            continue;
        }

        claimed.insert(output.clone(), input.clone());
        candidates.push(Candidate {
            input,
            output,
            output_exists,
        });
    }
    candidates
}

fn plan(candidates: Vec<Candidate>) -> Vec<PlannedAction> {
    candidates
        .into_iter()
        .map(|c| {
            let action = if c.output_exists {
                info!(
                    "[DRY RUN] Would replace: {} → {}",
                    c.input.display(),
                    c.output.display()
                );
                PlannedKind::Replace
            } else {
                info!(
                    "[DRY RUN] Would convert: {} → {}",
                    c.input.display(),
                    c.output.display()
                );
                PlannedKind::Convert
            };
            PlannedAction {
                input_path: c.input,
                output_path: c.output,
                action,
            }
        })
        .collect()
}

fn record(report: &mut BatchReport, outcome: ConversionOutcome) {
    if outcome.success {
        info!("{}", outcome.message);
    } else if outcome.is_skip() {
        warn!("{}", outcome.message);
    } else {
        error!("{}", outcome.message);
    }
    report.summary.record(&outcome);
    report.outcomes.push(outcome);
    debug!(
        successful = report.summary.successful,
        failed = report.summary.failed,
        skipped = report.summary.skipped,
        "Progress"
    );
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("worker panicked: {}", detail)
}
