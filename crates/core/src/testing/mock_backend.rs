//! Mock conversion backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{BackendError, ConversionBackend};

/// Contents written to the output file on a successful mock conversion.
pub const MOCK_OUTPUT: &[u8] = b"mock pptx";

/// A recorded backend invocation for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// What the mock does when asked to convert a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Write `MOCK_OUTPUT` to the output path (unless disabled) and succeed.
    Succeed,
    /// Return a conversion failure without touching the output.
    Fail,
    /// Never complete.
    Hang,
    /// Panic inside the conversion.
    Panic,
}

/// Mock implementation of the `ConversionBackend` trait.
///
/// Provides controllable behavior for testing:
/// - Record every invocation
/// - Per-file behaviors keyed by file name (`"b.ppt"`)
/// - Fixed and jittered conversion delays
/// - Availability toggling
/// - Peak concurrency tracking
/// - An optional engine concurrency limit
///
/// # Example
///
/// ```rust,ignore
/// use pptx_convert_core::testing::{MockBackend, MockBehavior};
///
/// let backend = MockBackend::new();
/// backend.set_behavior("broken.ppt", MockBehavior::Fail).await;
/// backend.set_random_delay(Duration::from_millis(50)).await;
///
/// // ... run a batch ...
///
/// assert_eq!(backend.call_count().await, 3);
/// assert!(backend.peak_concurrency() <= 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    behaviors: Arc<RwLock<HashMap<String, MockBehavior>>>,
    default_behavior: Arc<RwLock<MockBehavior>>,
    delay: Arc<RwLock<Duration>>,
    max_random_delay: Arc<RwLock<Option<Duration>>>,
    available: Arc<AtomicBool>,
    write_output: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    /// Zero means unlimited.
    max_concurrency: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter however the conversion ends.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockBackend {
    /// Create a new mock backend that succeeds instantly.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            behaviors: Arc::new(RwLock::new(HashMap::new())),
            default_behavior: Arc::new(RwLock::new(MockBehavior::Succeed)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            max_random_delay: Arc::new(RwLock::new(None)),
            available: Arc::new(AtomicBool::new(true)),
            write_output: Arc::new(AtomicBool::new(true)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
            max_concurrency: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of conversions attempted.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Clear recorded calls and the concurrency high-water mark.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
        self.peak_in_flight.store(0, Ordering::SeqCst);
    }

    /// Set the behavior for files with the given name.
    pub async fn set_behavior(&self, file_name: &str, behavior: MockBehavior) {
        self.behaviors
            .write()
            .await
            .insert(file_name.to_string(), behavior);
    }

    /// Set the behavior for files without a specific one.
    pub async fn set_default_behavior(&self, behavior: MockBehavior) {
        *self.default_behavior.write().await = behavior;
    }

    /// Set a fixed delay applied to every conversion.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Add a uniformly random extra delay in `0..=max` to every conversion.
    pub async fn set_random_delay(&self, max: Duration) {
        *self.max_random_delay.write().await = Some(max);
    }

    /// Toggle availability; an unavailable mock fails validation and every
    /// conversion.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether successful conversions write an output file.
    pub fn set_write_output(&self, write: bool) {
        self.write_output.store(write, Ordering::SeqCst);
    }

    /// Reports an engine limit of `limit` concurrent conversions.
    ///
    /// Converters read the limit when they are created.
    pub fn set_max_concurrency(&self, limit: usize) {
        self.max_concurrency.store(limit, Ordering::SeqCst);
    }

    /// Highest number of conversions observed running at once.
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn behavior_for(&self, input: &Path) -> MockBehavior {
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.behaviors.read().await.get(&name) {
            Some(behavior) => *behavior,
            None => *self.default_behavior.read().await,
        }
    }

    async fn simulated_delay(&self) -> Duration {
        let mut delay = *self.delay.read().await;
        if let Some(max) = *self.max_random_delay.read().await {
            let max_ms = max.as_millis() as u64;
            delay += Duration::from_millis(rand::random_range(0..=max_ms));
        }
        delay
    }
}

#[async_trait]
impl ConversionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn max_concurrency(&self) -> Option<usize> {
        match self.max_concurrency.load(Ordering::SeqCst) {
            0 => None,
            limit => Some(limit),
        }
    }

    async fn convert_one(&self, input: &Path, output: &Path) -> Result<(), BackendError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(&self.in_flight);
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);

        self.calls.write().await.push(RecordedCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });

        if !self.available.load(Ordering::SeqCst) {
            return Err(BackendError::EngineNotFound {
                path: PathBuf::from("mock"),
            });
        }

        let delay = self.simulated_delay().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.behavior_for(input).await {
            MockBehavior::Succeed => {
                if self.write_output.load(Ordering::SeqCst) {
                    tokio::fs::write(output, MOCK_OUTPUT).await?;
                }
                Ok(())
            }
            MockBehavior::Fail => Err(BackendError::conversion_failed(
                "mock engine exited with code: Some(1)",
                Some(format!("mock failure for {}", input.display())),
            )),
            MockBehavior::Hang => std::future::pending().await,
            MockBehavior::Panic => panic!("mock backend panicked on {}", input.display()),
        }
    }

    async fn validate(&self) -> Result<(), BackendError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::unavailable("mock backend disabled"))
        }
    }
}
