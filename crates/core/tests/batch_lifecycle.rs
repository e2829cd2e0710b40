//! Batch lifecycle integration tests.
//!
//! These tests drive the batch orchestrator with a mock backend:
//! - Discovery scope (top level vs recursive)
//! - Skip, dry-run and idempotence behavior
//! - Concurrency bound under random delays
//! - Timeout and panic isolation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use pptx_convert_core::{
    batch::{BatchError, BatchOptions, BatchOrchestrator, BatchSummary, PlannedKind},
    converter::{FailureKind, FileConverter},
    testing::{fixtures, MockBackend, MockBehavior, MOCK_OUTPUT},
};

/// Test helper wiring a mock backend into an orchestrator over a temp tree.
struct TestHarness {
    orchestrator: BatchOrchestrator,
    backend: MockBackend,
    root: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_timeout(Duration::from_secs(10))
    }

    fn with_timeout(timeout: Duration) -> Self {
        let backend = MockBackend::new();
        let converter = FileConverter::new(Arc::new(backend.clone()), timeout);

        Self {
            orchestrator: BatchOrchestrator::new(converter),
            backend,
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn create(&self, relative: &[&str]) -> Vec<PathBuf> {
        fixtures::create_presentations(self.path(), relative)
    }

    async fn run(&self, options: BatchOptions) -> pptx_convert_core::BatchReport {
        self.orchestrator
            .run(self.path(), &options)
            .await
            .expect("Batch should run")
    }
}

fn summary(successful: usize, failed: usize, skipped: usize) -> BatchSummary {
    BatchSummary {
        successful,
        failed,
        skipped,
    }
}

#[tokio::test]
async fn test_scope_non_recursive_and_recursive() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt", "b.ppt", "S/c.ppt"]);

    let report = harness.run(BatchOptions::default()).await;
    assert_eq!(report.summary, summary(2, 0, 0));
    assert!(!harness.path().join("S/c.pptx").exists());

    let report = harness
        .run(BatchOptions::default().with_recursive(true))
        .await;
    assert_eq!(report.summary, summary(3, 0, 0));
    assert_eq!(
        std::fs::read(harness.path().join("S/c.pptx")).unwrap(),
        MOCK_OUTPUT
    );
}

#[tokio::test]
async fn test_summary_accounts_for_every_file() {
    let harness = TestHarness::new();
    harness.create(&["ok1.ppt", "ok2.ppt", "bad.ppt", "done.ppt", "done.pptx", "x.txt"]);
    harness.backend.set_behavior("bad.ppt", MockBehavior::Fail).await;

    let report = harness
        .run(BatchOptions::default().with_overwrite_existing(false))
        .await;

    assert_eq!(report.summary, summary(2, 1, 1));
    assert_eq!(report.summary.total(), report.discovered);
    assert_eq!(report.discovered, 4);
    assert_eq!(report.outcomes.len(), 3);
}

#[tokio::test]
async fn test_second_run_without_replace_is_idempotent() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt", "b.ppt", "S/c.ppt"]);
    let options = BatchOptions::default()
        .with_recursive(true)
        .with_overwrite_existing(false);

    let first = harness.run(options.clone()).await;
    assert_eq!(first.summary, summary(3, 0, 0));
    harness.backend.clear_recorded().await;

    let second = harness.run(options).await;
    assert_eq!(second.summary, summary(0, 0, 3));
    assert_eq!(harness.backend.call_count().await, 0);
}

#[tokio::test]
async fn test_replace_by_default() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt"]);
    std::fs::write(harness.path().join("a.pptx"), b"stale").unwrap();

    let report = harness.run(BatchOptions::default()).await;

    assert_eq!(report.summary, summary(1, 0, 0));
    assert!(report.outcomes[0].replaced);
    assert_eq!(
        std::fs::read(harness.path().join("a.pptx")).unwrap(),
        MOCK_OUTPUT
    );
}

#[tokio::test]
async fn test_dry_run_touches_nothing_for_any_worker_count() {
    for workers in [1, 3, 10, 64] {
        let harness = TestHarness::new();
        harness.create(&["a.ppt", "b.ppt", "b.pptx", "S/c.ppt"]);

        let report = harness
            .run(
                BatchOptions::default()
                    .with_dry_run(true)
                    .with_recursive(true)
                    .with_workers(workers),
            )
            .await;

        assert_eq!(report.summary.successful, 0);
        assert_eq!(report.summary.failed, 0);
        assert_eq!(report.planned.len(), 3);
        assert_eq!(
            report
                .planned
                .iter()
                .filter(|p| p.action == PlannedKind::Replace)
                .count(),
            1
        );
        assert_eq!(harness.backend.call_count().await, 0);
        assert!(!harness.path().join("a.pptx").exists());
        assert_eq!(std::fs::read(harness.path().join("b.pptx")).unwrap(), fixtures::LEGACY_CONTENT);
    }
}

#[tokio::test]
async fn test_dry_run_counts_skips() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt", "b.ppt", "b.pptx"]);

    let report = harness
        .run(
            BatchOptions::default()
                .with_dry_run(true)
                .with_overwrite_existing(false),
        )
        .await;

    assert_eq!(report.summary, summary(0, 0, 1));
    assert_eq!(report.planned.len(), 1);
    assert_eq!(report.planned.len() + report.summary.skipped, report.discovered);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_extension_case_twins_never_share_an_output() {
    for overwrite in [true, false] {
        let harness = TestHarness::new();
        harness.create(&["Deck.ppt", "Deck.PPT", "other.ppt"]);

        let report = harness
            .run(BatchOptions::default().with_overwrite_existing(overwrite))
            .await;

        assert_eq!(report.summary, summary(2, 1, 0), "overwrite={}", overwrite);
        assert_eq!(report.summary.total(), report.discovered);
        let outputs: Vec<_> = report
            .outcomes
            .iter()
            .filter(|o| o.success)
            .filter_map(|o| o.output_path.clone())
            .collect();
        assert_eq!(outputs.len(), 2);
        assert_ne!(outputs[0], outputs[1]);
        assert_eq!(harness.backend.call_count().await, 2);
        let conflict = report.outcomes.iter().find(|o| !o.success).unwrap();
        assert!(conflict.message.contains("is also the target of"));
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_dry_run_reports_extension_case_twins() {
    let harness = TestHarness::new();
    harness.create(&["Deck.ppt", "Deck.PPT"]);

    let report = harness
        .run(BatchOptions::default().with_dry_run(true))
        .await;

    assert_eq!(report.summary, summary(0, 1, 0));
    assert_eq!(report.planned.len(), 1);
    assert_eq!(
        report.planned.len() + report.summary.skipped + report.summary.failed,
        report.discovered
    );
    assert_eq!(harness.backend.call_count().await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_jobs_with_random_delays_stay_bounded() {
    let harness = TestHarness::new();
    fixtures::create_numbered_presentations(harness.path(), 50);
    harness
        .backend
        .set_random_delay(Duration::from_millis(50))
        .await;

    for _ in 0..3 {
        harness.backend.clear_recorded().await;

        let report = harness
            .run(BatchOptions::default().with_workers(10))
            .await;

        assert_eq!(report.summary, summary(50, 0, 0));
        assert_eq!(harness.backend.call_count().await, 50);
        assert!(
            harness.backend.peak_concurrency() <= 10,
            "peak concurrency {} exceeded worker count",
            harness.backend.peak_concurrency()
        );
    }
}

#[tokio::test]
async fn test_worker_count_is_reached() {
    let harness = TestHarness::new();
    fixtures::create_numbered_presentations(harness.path(), 20);
    harness.backend.set_delay(Duration::from_millis(50)).await;

    let report = harness.run(BatchOptions::default().with_workers(4)).await;

    assert_eq!(report.summary, summary(20, 0, 0));
    assert_eq!(harness.backend.peak_concurrency(), 4);
}

#[tokio::test]
async fn test_hanging_job_times_out_while_others_complete() {
    let harness = TestHarness::with_timeout(Duration::from_millis(300));
    harness.create(&["a.ppt", "stuck.ppt", "c.ppt", "d.ppt"]);
    harness
        .backend
        .set_behavior("stuck.ppt", MockBehavior::Hang)
        .await;

    let start = Instant::now();
    let report = harness.run(BatchOptions::default().with_workers(2)).await;
    let elapsed = start.elapsed();

    assert_eq!(report.summary, summary(3, 1, 0));
    let failed = report.outcomes.iter().find(|o| !o.success).unwrap();
    assert_eq!(failed.failure, Some(FailureKind::Timeout));
    assert!(failed.input_path.ends_with("stuck.ppt"));
    assert!(!harness.path().join("stuck.pptx").exists());
    assert!(elapsed >= Duration::from_millis(300));
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_panicking_job_fails_alone() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt", "b.ppt", "boom.ppt", "d.ppt"]);
    harness
        .backend
        .set_behavior("boom.ppt", MockBehavior::Panic)
        .await;

    let report = harness.run(BatchOptions::default().with_workers(2)).await;

    assert_eq!(report.summary, summary(3, 1, 0));
    let failed = report.outcomes.iter().find(|o| !o.success).unwrap();
    assert_eq!(failed.failure, Some(FailureKind::Internal));
    assert!(failed.input_path.ends_with("boom.ppt"));
}

#[tokio::test]
async fn test_backend_that_claims_success_without_output() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt"]);
    harness.backend.set_write_output(false);

    let report = harness.run(BatchOptions::default()).await;

    // The backend contract is to write the output; the converter trusts it.
    assert_eq!(report.summary, summary(1, 0, 0));
    assert!(!harness.path().join("a.pptx").exists());
}

#[tokio::test]
async fn test_zero_workers_rejected() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt"]);

    let result = harness
        .orchestrator
        .run(harness.path(), &BatchOptions::default().with_workers(0))
        .await;

    assert!(matches!(result, Err(BatchError::InvalidWorkerCount(0))));
    assert_eq!(harness.backend.call_count().await, 0);
}

#[tokio::test]
async fn test_no_candidates() {
    let harness = TestHarness::new();
    harness.create(&["notes.txt", "deck.pptx"]);

    let report = harness.run(BatchOptions::default()).await;

    assert_eq!(report.discovered, 0);
    assert_eq!(report.summary, BatchSummary::default());
    assert!(report.outcomes.is_empty());
}

#[tokio::test]
async fn test_backend_unavailable() {
    let harness = TestHarness::new();
    harness.create(&["a.ppt"]);
    harness.backend.set_available(false);

    let result = harness
        .orchestrator
        .run(harness.path(), &BatchOptions::default())
        .await;

    match result {
        Err(BatchError::BackendUnavailable(reason)) => {
            assert!(reason.contains("mock backend disabled"), "{}", reason)
        }
        other => panic!("Expected BackendUnavailable, got {:?}", other.map(|r| r.summary)),
    }
}
