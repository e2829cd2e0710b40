//! Conversion backends.
//!
//! This module provides the `ConversionBackend` trait, the single capability
//! the rest of the crate needs from an office engine, and two implementations:
//!
//! - `SofficeBackend`: headless LibreOffice, one process per conversion
//! - `PowerPointBackend`: Microsoft PowerPoint through COM automation (Windows)
//!
//! The platform choice is made once at startup by `create_backend`.
//!
//! # Example
//!
//! ```ignore
//! use pptx_convert_core::backend::{create_backend, BackendConfig};
//!
//! let backend = create_backend(&BackendConfig::default());
//! backend.validate().await?;
//! backend.convert_one(Path::new("talk.ppt"), Path::new("talk.pptx")).await?;
//! ```

mod config;
mod discovery;
mod error;
mod powerpoint;
mod scratch;
mod soffice;
mod traits;

use std::sync::Arc;

pub use config::{BackendConfig, Engine};
pub use discovery::find_soffice;
pub use error::BackendError;
pub use powerpoint::PowerPointBackend;
pub use soffice::SofficeBackend;
pub use traits::ConversionBackend;

/// Builds the backend for the configured (or platform default) engine.
pub fn create_backend(config: &BackendConfig) -> Arc<dyn ConversionBackend> {
    match config.resolved_engine() {
        Engine::PowerPoint => Arc::new(PowerPointBackend::new(config.clone())),
        Engine::LibreOffice | Engine::Auto => Arc::new(SofficeBackend::new(config.clone())),
    }
}
