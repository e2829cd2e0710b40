//! Finding legacy presentations in a directory tree.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::converter::is_legacy_presentation;

use super::error::BatchError;

/// Lists legacy presentations under `directory`.
///
/// Non-recursive discovery only looks at the top level. Symlinks to files
/// are included; unreadable entries are logged and skipped. The order of the
/// result is unspecified.
pub fn discover_files(directory: &Path, recursive: bool) -> Vec<PathBuf> {
    let mut walker = WalkDir::new(directory).min_depth(1);
    if !recursive {
        walker = walker.max_depth(1);
    }

    walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
        })
        .map(|entry| entry.into_path())
        .filter(|path| is_legacy_presentation(path))
        .collect()
}

/// Runs `discover_files` on the blocking pool.
pub(crate) async fn discover(directory: &Path, recursive: bool) -> Result<Vec<PathBuf>, BatchError> {
    let directory = directory.to_path_buf();
    tokio::task::spawn_blocking(move || discover_files(&directory, recursive))
        .await
        .map_err(|e| BatchError::Discovery(e.to_string()))
}
