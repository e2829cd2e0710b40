//! Locating the LibreOffice `soffice` executable.

use std::path::{Path, PathBuf};

/// Well-known install locations, checked before `PATH`.
const COMMON_SOFFICE_PATHS: &[&str] = &[
    "/Applications/LibreOffice.app/Contents/MacOS/soffice",
    "/usr/local/bin/soffice",
    "/opt/homebrew/bin/soffice",
    "/usr/bin/soffice",
    "/usr/lib/libreoffice/program/soffice",
    "/opt/libreoffice/program/soffice",
    "/snap/bin/libreoffice",
    r"C:\Program Files\LibreOffice\program\soffice.exe",
    r"C:\Program Files (x86)\LibreOffice\program\soffice.exe",
];

#[cfg(windows)]
const SOFFICE_NAMES: &[&str] = &["soffice.exe", "soffice.com"];
#[cfg(not(windows))]
const SOFFICE_NAMES: &[&str] = &["soffice", "libreoffice"];

/// Finds `soffice`, preferring an explicitly configured path.
///
/// Returns `None` when an explicit path is given but does not exist; an
/// explicit choice is never silently replaced by a discovered one.
pub fn find_soffice(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.is_file().then(|| path.to_path_buf());
    }

    COMMON_SOFFICE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
        .or_else(|| {
            std::env::var_os("PATH")
                .and_then(|paths| search_path(std::env::split_paths(&paths), SOFFICE_NAMES))
        })
}

/// Returns the first `dir/name` that exists, in directory order.
fn search_path<I>(dirs: I, names: &[&str]) -> Option<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    dirs.into_iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}
