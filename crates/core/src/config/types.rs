use serde::{Deserialize, Serialize};

use crate::backend::BackendConfig;
use crate::batch::{BatchOptions, DEFAULT_WORKERS};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Batch defaults, overridable per run from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BatchConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_overwrite_existing")]
    pub overwrite_existing: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            recursive: false,
            overwrite_existing: default_overwrite_existing(),
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_overwrite_existing() -> bool {
    true
}

impl BatchConfig {
    /// Live-mode batch options from these defaults.
    pub fn options(&self) -> BatchOptions {
        BatchOptions::default()
            .with_workers(self.workers)
            .with_recursive(self.recursive)
            .with_overwrite_existing(self.overwrite_existing)
    }
}
