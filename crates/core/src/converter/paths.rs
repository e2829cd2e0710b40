//! Extension checks and output path resolution.

use std::path::{Path, PathBuf};

/// Extension of the legacy presentation format.
pub const LEGACY_EXTENSION: &str = "ppt";

/// Extension of the modern presentation container.
pub const MODERN_EXTENSION: &str = "pptx";

/// Whether `path` has the legacy extension, case-insensitively.
pub fn is_legacy_presentation(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(LEGACY_EXTENSION))
}

/// The explicit output when given, otherwise `input` with the modern
/// extension in the same directory.
pub fn resolve_output_path(input: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => input.with_extension(MODERN_EXTENSION),
    }
}
