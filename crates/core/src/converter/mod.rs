//! Single-file conversion.
//!
//! `FileConverter` validates one input, resolves its output path, applies
//! the overwrite policy and delegates to a `ConversionBackend` under a hard
//! timeout. Every failure is reported as a `ConversionOutcome`, never as an
//! error, so callers running many conversions only ever aggregate outcomes.
//!
//! # Example
//!
//! ```ignore
//! use pptx_convert_core::converter::FileConverter;
//!
//! let converter = FileConverter::from_config(backend, &config.backend);
//! converter.ensure_backend().await?;
//!
//! let outcome = converter.convert(Path::new("talk.ppt"), None, false).await;
//! println!("{}", outcome.message);
//! ```

mod error;
mod file_converter;
mod paths;
mod types;

pub use error::ConvertError;
pub use file_converter::FileConverter;
pub use paths::{is_legacy_presentation, resolve_output_path, LEGACY_EXTENSION, MODERN_EXTENSION};
pub use types::{ConversionJob, ConversionOutcome, FailureKind};
