//! Testing utilities and a mock backend.
//!
//! `MockBackend` stands in for an office engine so the converter and the
//! batch orchestrator can be exercised without LibreOffice or PowerPoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use pptx_convert_core::testing::{fixtures, MockBackend};
//!
//! let dir = tempfile::TempDir::new()?;
//! fixtures::create_presentations(dir.path(), &["a.ppt", "S/c.ppt"]);
//!
//! let backend = MockBackend::new();
//! let converter = FileConverter::new(Arc::new(backend.clone()), Duration::from_secs(5));
//! ```

mod mock_backend;

pub use mock_backend::{MockBackend, MockBehavior, RecordedCall, MOCK_OUTPUT};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};

    /// Placeholder contents for a legacy presentation.
    pub const LEGACY_CONTENT: &[u8] = b"legacy ppt";

    /// Create files at the given paths relative to `root`, creating parent
    /// directories as needed. Returns the absolute paths in input order.
    pub fn create_presentations(root: &Path, relative: &[&str]) -> Vec<PathBuf> {
        relative
            .iter()
            .map(|rel| {
                let path = root.join(rel);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).expect("Failed to create fixture directory");
                }
                std::fs::write(&path, LEGACY_CONTENT).expect("Failed to write fixture file");
                path
            })
            .collect()
    }

    /// Create `count` presentations named `deck-000.ppt`, `deck-001.ppt`, ...
    pub fn create_numbered_presentations(root: &Path, count: usize) -> Vec<PathBuf> {
        let names: Vec<String> = (0..count).map(|i| format!("deck-{:03}.ppt", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        create_presentations(root, &refs)
    }
}
