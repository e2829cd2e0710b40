//! Private scratch space for engine output and the final move into place.

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

use super::error::BackendError;

/// Creates a fresh per-job scratch directory under `parent`.
///
/// The directory and everything in it is removed when the returned guard is
/// dropped, including when the conversion future is cancelled.
pub(crate) async fn create_scratch_dir(parent: &Path) -> Result<TempDir, BackendError> {
    fs::create_dir_all(parent).await?;
    let parent = parent.to_path_buf();
    let dir = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new().prefix("job-").tempdir_in(parent)
    })
    .await
    .map_err(|e| BackendError::Io(std::io::Error::other(e)))??;
    Ok(dir)
}

/// Moves a finished file from scratch space to `destination`.
///
/// Tries a rename first. Across filesystems the file is copied to a hidden
/// sibling of `destination` and renamed from there, so `destination` is
/// either untouched or complete.
pub(crate) async fn move_into_place(source: &Path, destination: &Path) -> Result<(), BackendError> {
    match fs::rename(source, destination).await {
        Ok(()) => return Ok(()),
        Err(e) if is_cross_device(&e) => {}
        Err(e) => return Err(placement_failed(source, destination, e)),
    }

    let staging = StagedFile::new(staging_path(destination));
    fs::copy(source, staging.path())
        .await
        .map_err(|e| placement_failed(source, destination, e))?;
    fs::rename(staging.path(), destination)
        .await
        .map_err(|e| placement_failed(source, destination, e))?;
    staging.keep();
    Ok(())
}

/// A half-written sibling of the destination, removed on drop unless kept.
///
/// Dropping happens on error returns and when the placing future is
/// cancelled by the job timeout.
struct StagedFile {
    path: PathBuf,
    armed: bool,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// The file was renamed away; nothing is left to clean up.
    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

// EXDEV is 18 on Linux and macOS.
fn is_cross_device(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18)
}

fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    destination.with_file_name(format!(".{}.partial", name))
}

fn placement_failed(source: &Path, destination: &Path, error: std::io::Error) -> BackendError {
    BackendError::PlacementFailed {
        from: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    }
}
