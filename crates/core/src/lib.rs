pub mod backend;
pub mod batch;
pub mod config;
pub mod converter;
pub mod testing;

pub use backend::{create_backend, BackendConfig, BackendError, ConversionBackend, Engine};
pub use batch::{BatchError, BatchOptions, BatchOrchestrator, BatchReport, BatchSummary};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{ConversionJob, ConversionOutcome, ConvertError, FailureKind, FileConverter};
