//! Microsoft PowerPoint backend, driven through COM automation from PowerShell.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::debug;

use super::config::BackendConfig;
use super::error::BackendError;
use super::scratch::{create_scratch_dir, move_into_place};
use super::traits::ConversionBackend;

/// `ppSaveAsOpenXMLPresentation`.
const SAVE_AS_PPTX: u32 = 24;

/// How long the availability check may take.
const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Converts presentations through a locally installed PowerPoint.
///
/// PowerPoint is a single-instance COM server, so automation sessions are
/// serialized: only one conversion talks to it at a time, however many
/// workers the batch uses. The backend reports a concurrency of one so the
/// converter queues jobs before their timeout starts.
pub struct PowerPointBackend {
    config: BackendConfig,
    session: Mutex<()>,
}

impl PowerPointBackend {
    /// Creates a new PowerPoint backend.
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            session: Mutex::new(()),
        }
    }

    fn powershell(&self) -> Command {
        let mut command = Command::new(&self.config.powershell_path);
        command
            .args(["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn map_spawn_error(&self, e: std::io::Error) -> BackendError {
        if e.kind() == std::io::ErrorKind::NotFound {
            BackendError::EngineNotFound {
                path: self.config.powershell_path.clone(),
            }
        } else {
            BackendError::Io(e)
        }
    }
}

/// Quotes a value as a PowerShell single-quoted string literal.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Builds the automation script converting `input` to `output`.
///
/// PowerPoint is only quit when no other presentation is open, so a user's
/// running session survives.
fn build_script(input: &Path, output: &Path) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'\n\
         $app = New-Object -ComObject PowerPoint.Application\n\
         try {{\n\
         \x20 $deck = $app.Presentations.Open({input}, -1, 0, 0)\n\
         \x20 try {{ $deck.SaveAs({output}, {format}) }} finally {{ $deck.Close() }}\n\
         }} finally {{\n\
         \x20 if ($app.Presentations.Count -eq 0) {{ $app.Quit() }}\n\
         }}\n",
        input = ps_quote(&input.to_string_lossy()),
        output = ps_quote(&output.to_string_lossy()),
        format = SAVE_AS_PPTX,
    )
}

const CHECK_SCRIPT: &str =
    "if ([type]::GetTypeFromProgID('PowerPoint.Application')) { exit 0 } else { exit 1 }";

#[async_trait]
impl ConversionBackend for PowerPointBackend {
    fn name(&self) -> &str {
        "powerpoint"
    }

    fn max_concurrency(&self) -> Option<usize> {
        Some(1)
    }

    async fn convert_one(&self, input: &Path, output: &Path) -> Result<(), BackendError> {
        let scratch = create_scratch_dir(&self.config.scratch_dir).await?;
        let input = std::path::absolute(input)?;
        let staged = scratch.path().join(
            output
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("output.pptx")),
        );
        let script = build_script(&input, &staged);

        let result = {
            let _session = self.session.lock().await;
            debug!(input = %input.display(), "Driving PowerPoint");
            self.powershell()
                .arg("-Command")
                .arg(&script)
                .output()
                .await
                .map_err(|e| self.map_spawn_error(e))?
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(BackendError::conversion_failed(
                format!("PowerPoint automation exited with code: {:?}", result.status.code()),
                (!stderr.is_empty()).then_some(stderr),
            ));
        }

        if !tokio::fs::try_exists(&staged).await.unwrap_or(false) {
            return Err(BackendError::conversion_failed(
                format!("PowerPoint produced no output for {}", input.display()),
                None,
            ));
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        move_into_place(&staged, output).await
    }

    async fn validate(&self) -> Result<(), BackendError> {
        if !cfg!(windows) {
            return Err(BackendError::unavailable(
                "PowerPoint automation requires Windows",
            ));
        }

        let check = self
            .powershell()
            .arg("-Command")
            .arg(CHECK_SCRIPT)
            .output();
        let result = tokio::time::timeout(CHECK_TIMEOUT, check)
            .await
            .map_err(|_| BackendError::unavailable("PowerPoint availability check timed out"))?
            .map_err(|e| self.map_spawn_error(e))?;

        if !result.status.success() {
            return Err(BackendError::unavailable(
                "Microsoft PowerPoint is not installed or not registered for automation",
            ));
        }

        tokio::fs::create_dir_all(&self.config.scratch_dir).await?;
        Ok(())
    }
}
