//! LibreOffice (`soffice --headless`) backend.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tracing::debug;

use super::config::BackendConfig;
use super::discovery::find_soffice;
use super::error::BackendError;
use super::scratch::{create_scratch_dir, move_into_place};
use super::traits::ConversionBackend;

/// Filter name passed to `--convert-to`.
const TARGET_FILTER: &str = "pptx";

/// Converts presentations by running a headless LibreOffice per job.
///
/// Every invocation gets its own scratch directory and its own user profile
/// inside it, so concurrent engine processes never share state.
pub struct SofficeBackend {
    config: BackendConfig,
    soffice: Option<PathBuf>,
}

impl SofficeBackend {
    /// Creates a backend, locating `soffice` from the config or the host.
    pub fn new(config: BackendConfig) -> Self {
        let soffice = find_soffice(config.soffice_path.as_deref());
        Self { config, soffice }
    }

    /// The resolved engine path, if one was found.
    pub fn soffice_path(&self) -> Option<&Path> {
        self.soffice.as_deref()
    }

    fn require_soffice(&self) -> Result<&Path, BackendError> {
        self.soffice
            .as_deref()
            .ok_or_else(|| BackendError::EngineNotFound {
                path: self
                    .config
                    .soffice_path
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("soffice")),
            })
    }

    /// Builds soffice arguments for converting `input` into `outdir`.
    fn build_args(input: &Path, outdir: &Path, profile_dir: &Path) -> Vec<OsString> {
        vec![
            OsString::from(format!("-env:UserInstallation={}", file_url(profile_dir))),
            OsString::from("--headless"),
            OsString::from("--norestore"),
            OsString::from("--nolockcheck"),
            OsString::from("--convert-to"),
            OsString::from(TARGET_FILTER),
            OsString::from("--outdir"),
            outdir.as_os_str().to_os_string(),
            input.as_os_str().to_os_string(),
        ]
    }
}

/// Renders an absolute path as a `file://` URL, percent-encoding each segment.
fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let encoded = raw
        .split('/')
        .map(|segment| {
            // Keep Windows drive letters ("C:") readable.
            if segment.len() == 2 && segment.ends_with(':') {
                segment.to_string()
            } else {
                urlencoding::encode(segment).into_owned()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    if encoded.starts_with('/') {
        format!("file://{}", encoded)
    } else {
        format!("file:///{}", encoded)
    }
}

/// Name LibreOffice gives the converted file inside `--outdir`.
fn converted_name(input: &Path) -> OsString {
    let mut name = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".");
    name.push(TARGET_FILTER);
    name
}

/// The process group of a running engine, killed as a whole on drop.
///
/// `soffice` is often a launcher script that starts `soffice.bin` and waits
/// for it. `kill_on_drop` only reaches the launcher, so a timed-out job
/// would otherwise leave the real engine running.
struct EngineGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    leader: Option<u32>,
}

impl EngineGroup {
    fn new(leader: Option<u32>) -> Self {
        Self { leader }
    }

    /// The engine exited on its own.
    fn release(mut self) {
        self.leader = None;
    }
}

impl Drop for EngineGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pgid) = self.leader.take() {
                debug!(pgid, "Killing soffice process group");
                let _ = std::process::Command::new("kill")
                    .args(["-s", "KILL", "--", &format!("-{}", pgid)])
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
            }
        }
    }
}

fn lossy_trimmed(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes).trim().to_string();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl ConversionBackend for SofficeBackend {
    fn name(&self) -> &str {
        "libreoffice"
    }

    async fn convert_one(&self, input: &Path, output: &Path) -> Result<(), BackendError> {
        let soffice = self.require_soffice()?;
        let start = Instant::now();

        let scratch = create_scratch_dir(&self.config.scratch_dir).await?;
        let outdir = scratch.path().join("out");
        let profile_dir = scratch.path().join("profile");
        tokio::fs::create_dir_all(&outdir).await?;

        let input = std::path::absolute(input)?;
        let args = Self::build_args(&input, &outdir, &profile_dir);
        debug!(soffice = %soffice.display(), ?args, "Running soffice");

        let mut command = Command::new(soffice);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::EngineNotFound {
                    path: soffice.to_path_buf(),
                }
            } else {
                BackendError::Io(e)
            }
        })?;
        let group = EngineGroup::new(child.id());
        let result = child.wait_with_output().await?;
        group.release();

        if !result.status.success() {
            return Err(BackendError::conversion_failed(
                format!("soffice exited with code: {:?}", result.status.code()),
                lossy_trimmed(&result.stderr),
            ));
        }

        // soffice reports unreadable input on stdout and still exits 0.
        let produced = outdir.join(converted_name(&input));
        if !tokio::fs::try_exists(&produced).await.unwrap_or(false) {
            return Err(BackendError::conversion_failed(
                format!("soffice produced no output for {}", input.display()),
                lossy_trimmed(&result.stderr).or_else(|| lossy_trimmed(&result.stdout)),
            ));
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        move_into_place(&produced, output).await?;

        debug!(
            input = %input.display(),
            output = %output.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "soffice conversion finished"
        );
        Ok(())
    }

    async fn validate(&self) -> Result<(), BackendError> {
        let soffice = self.require_soffice()?;
        if !soffice.is_file() {
            return Err(BackendError::EngineNotFound {
                path: soffice.to_path_buf(),
            });
        }

        tokio::fs::create_dir_all(&self.config.scratch_dir).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_args() {
        let args = SofficeBackend::build_args(
            Path::new("/decks/sunday.ppt"),
            Path::new("/tmp/job-1/out"),
            Path::new("/tmp/job-1/profile"),
        );

        assert_eq!(
            args[0],
            OsString::from("-env:UserInstallation=file:///tmp/job-1/profile")
        );
        assert!(args.contains(&OsString::from("--headless")));
        let convert_to = args.iter().position(|a| a == "--convert-to").unwrap();
        assert_eq!(args[convert_to + 1], OsString::from("pptx"));
        let outdir = args.iter().position(|a| a == "--outdir").unwrap();
        assert_eq!(args[outdir + 1], OsString::from("/tmp/job-1/out"));
        assert_eq!(args.last().unwrap(), &OsString::from("/decks/sunday.ppt"));
    }

    #[test]
    fn test_file_url_encodes_segments() {
        assert_eq!(
            file_url(Path::new("/tmp/my scratch/profile")),
            "file:///tmp/my%20scratch/profile"
        );
        assert_eq!(
            file_url(Path::new(r"C:\Users\Jo Ann\Temp")),
            "file:///C:/Users/Jo%20Ann/Temp"
        );
    }

    #[test]
    fn test_converted_name() {
        assert_eq!(
            converted_name(Path::new("/a/Easter Service.PPT")),
            OsString::from("Easter Service.pptx")
        );
    }

    #[tokio::test]
    async fn test_missing_engine_is_unavailable() {
        let scratch = TempDir::new().unwrap();
        let backend = SofficeBackend::new(
            BackendConfig::default()
                .with_soffice_path(PathBuf::from("/definitely/not/here/soffice"))
                .with_scratch_dir(scratch.path().to_path_buf()),
        );

        assert!(backend.soffice_path().is_none());
        assert!(!backend.is_available().await);

        let err = backend
            .convert_one(Path::new("/a.ppt"), Path::new("/a.pptx"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[cfg(unix)]
    mod fake_engine {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Writes an executable shell script standing in for soffice.
        fn fake_soffice(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("soffice");
            let script = format!(
                "#!/bin/sh\n\
                 outdir=\"\"\n\
                 while [ $# -gt 1 ]; do\n\
                 \x20 if [ \"$1\" = \"--outdir\" ]; then outdir=\"$2\"; shift; fi\n\
                 \x20 shift\n\
                 done\n\
                 input=\"$1\"\n\
                 name=$(basename \"$input\")\n\
                 name=\"${{name%.*}}\"\n\
                 {}\n",
                body
            );
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn backend_for(engine: PathBuf, scratch: &Path) -> SofficeBackend {
            SofficeBackend::new(
                BackendConfig::default()
                    .with_soffice_path(engine)
                    .with_scratch_dir(scratch.to_path_buf()),
            )
        }

        #[tokio::test]
        async fn test_successful_conversion_moves_output() {
            let bin = TempDir::new().unwrap();
            let scratch = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let engine = fake_soffice(
                bin.path(),
                "printf 'converted' > \"$outdir/$name.pptx\"",
            );

            let input = work.path().join("hymns.ppt");
            let output = work.path().join("hymns.pptx");
            std::fs::write(&input, b"legacy").unwrap();

            let backend = backend_for(engine, scratch.path());
            assert!(backend.is_available().await);
            backend.convert_one(&input, &output).await.unwrap();

            assert_eq!(std::fs::read_to_string(&output).unwrap(), "converted");
            // Scratch directories are cleaned up.
            assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
        }

        #[tokio::test]
        async fn test_nonzero_exit_reports_stderr() {
            let bin = TempDir::new().unwrap();
            let scratch = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let engine = fake_soffice(bin.path(), "echo 'general I/O error' >&2; exit 3");

            let input = work.path().join("broken.ppt");
            let output = work.path().join("broken.pptx");
            std::fs::write(&input, b"legacy").unwrap();

            let err = backend_for(engine, scratch.path())
                .convert_one(&input, &output)
                .await
                .unwrap_err();

            match &err {
                BackendError::ConversionFailed { reason, stderr } => {
                    assert!(reason.contains("Some(3)"));
                    assert_eq!(stderr.as_deref(), Some("general I/O error"));
                }
                other => panic!("unexpected error: {other:?}"),
            }
            assert!(!output.exists());
        }

        #[tokio::test]
        async fn test_missing_output_is_failure() {
            let bin = TempDir::new().unwrap();
            let scratch = TempDir::new().unwrap();
            let work = TempDir::new().unwrap();
            let engine = fake_soffice(
                bin.path(),
                "echo 'Error: source file could not be loaded'; exit 0",
            );

            let input = work.path().join("empty.ppt");
            let output = work.path().join("empty.pptx");
            std::fs::write(&input, b"").unwrap();

            let err = backend_for(engine, scratch.path())
                .convert_one(&input, &output)
                .await
                .unwrap_err();

            assert!(err.detail().contains("source file could not be loaded"));
            assert!(!output.exists());
        }
    }
}
