//! `--check-deps`: report whether the conversion engine can be used.

use tracing::{error, info};

use pptx_convert_core::{backend::find_soffice, BackendConfig, ConversionBackend, Engine};

/// Validates the backend, logging where the engine was found or how to
/// install it.
pub async fn check_dependencies(config: &BackendConfig, backend: &dyn ConversionBackend) -> bool {
    let engine = config.resolved_engine();

    match backend.validate().await {
        Ok(()) => {
            match engine {
                Engine::PowerPoint => info!("Found Microsoft PowerPoint automation"),
                _ => match find_soffice(config.soffice_path.as_deref()) {
                    Some(path) => info!("Found LibreOffice at: {}", path.display()),
                    None => info!("Using conversion engine: {}", backend.name()),
                },
            }
            true
        }
        Err(e) => {
            error!("{}", e);
            for hint in install_hints(engine) {
                error!("{}", hint);
            }
            false
        }
    }
}

fn install_hints(engine: Engine) -> &'static [&'static str] {
    match engine {
        Engine::PowerPoint => &[
            "Microsoft PowerPoint is required on Windows.",
            "Install Microsoft Office, or set backend.engine = \"libreoffice\".",
        ],
        _ if cfg!(target_os = "macos") => &[
            "Install LibreOffice:",
            "1. Download from https://www.libreoffice.org/",
            "2. Or use Homebrew: brew install --cask libreoffice",
        ],
        _ => &[
            "Install LibreOffice:",
            "1. Download from https://www.libreoffice.org/",
            "2. Or use your package manager: sudo apt-get install libreoffice",
            "Or point backend.soffice_path at an existing soffice binary.",
        ],
    }
}
