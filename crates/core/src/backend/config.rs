//! Configuration for conversion backends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which office engine performs conversions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// PowerPoint on Windows, LibreOffice everywhere else.
    #[default]
    Auto,
    LibreOffice,
    PowerPoint,
}

/// Configuration shared by the backend implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Engine selection.
    #[serde(default)]
    pub engine: Engine,

    /// Explicit path to the `soffice` binary. Discovered when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soffice_path: Option<PathBuf>,

    /// PowerShell executable used to drive PowerPoint automation.
    #[serde(default = "default_powershell_path")]
    pub powershell_path: PathBuf,

    /// Hard upper bound for a single conversion, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Parent directory for per-job scratch directories.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
}

fn default_powershell_path() -> PathBuf {
    PathBuf::from("powershell")
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("pptx-convert")
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            soffice_path: None,
            powershell_path: default_powershell_path(),
            timeout_secs: default_timeout(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl BackendConfig {
    /// Sets an explicit soffice path.
    pub fn with_soffice_path(mut self, path: PathBuf) -> Self {
        self.soffice_path = Some(path);
        self
    }

    /// Sets the PowerShell executable used to drive PowerPoint.
    pub fn with_powershell_path(mut self, path: PathBuf) -> Self {
        self.powershell_path = path;
        self
    }

    /// Sets the per-job timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the scratch directory.
    pub fn with_scratch_dir(mut self, scratch_dir: PathBuf) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }

    /// The per-job timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The engine actually used on this platform.
    pub fn resolved_engine(&self) -> Engine {
        match self.engine {
            Engine::Auto if cfg!(windows) => Engine::PowerPoint,
            Engine::Auto => Engine::LibreOffice,
            other => other,
        }
    }
}
