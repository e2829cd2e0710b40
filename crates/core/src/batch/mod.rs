//! Directory-level batch conversion.
//!
//! `BatchOrchestrator` discovers legacy presentations, drops those whose
//! output already exists when replacing is disabled, and converts the rest
//! on a bounded pool of tokio tasks. A dry run stops after planning.
//!
//! # Example
//!
//! ```ignore
//! use pptx_convert_core::batch::{BatchOptions, BatchOrchestrator};
//!
//! let orchestrator = BatchOrchestrator::new(converter);
//! let options = BatchOptions::default().with_recursive(true).with_workers(4);
//! let report = orchestrator.run(Path::new("decks"), &options).await?;
//! println!("{}", report.summary);
//! ```

mod discovery;
mod error;
mod orchestrator;
mod types;

pub use discovery::discover_files;
pub use error::BatchError;
pub use orchestrator::BatchOrchestrator;
pub use types::{
    BatchOptions, BatchReport, BatchSummary, PlannedAction, PlannedKind, DEFAULT_WORKERS,
};
