mod deps;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pptx_convert_core::{
    converter::{is_legacy_presentation, resolve_output_path},
    create_backend, load_config, validate_config, BatchOrchestrator, Config, ConversionOutcome,
    FileConverter,
};

/// Convert legacy PowerPoint .ppt files to .pptx.
///
/// Uses LibreOffice on macOS and Linux and Microsoft PowerPoint on Windows.
/// Existing .pptx files are replaced unless --no-replace is given.
#[derive(Parser, Debug)]
#[command(name = "pptx-convert")]
#[command(author, version, about)]
struct Args {
    /// Directory containing .ppt files, or a single .ppt file
    #[arg(required_unless_present = "check_deps")]
    path: Option<PathBuf>,

    /// Search subdirectories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Show what would be converted without converting
    #[arg(long)]
    dry_run: bool,

    /// Number of parallel workers for directory conversion (default: 10)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    workers: Option<u32>,

    /// Output path (single file only)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip files that already have a .pptx version instead of replacing them
    #[arg(long)]
    no_replace: bool,

    /// Replace an existing output without asking (single file only)
    #[arg(short = 'y', long)]
    yes: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Check that the conversion engine is installed and exit
    #[arg(long)]
    check_deps: bool,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-file conversion timeout in seconds (default: 300)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .with_target(false),
        )
        .init();
}

async fn run(args: Args) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    validate_config(&config).context("Invalid configuration")?;

    let backend = create_backend(&config.backend);

    if args.check_deps {
        return Ok(if deps::check_dependencies(&config.backend, backend.as_ref()).await {
            info!("All dependencies are available!");
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let Some(path) = args.path.as_deref() else {
        bail!("Path argument is required unless using --check-deps");
    };

    let converter = FileConverter::from_config(backend, &config.backend);
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Path not found: {}", path.display()))?;

    if metadata.is_file() {
        convert_file(&converter, path, &args).await
    } else if metadata.is_dir() {
        convert_directory(converter, path, &config, &args).await
    } else {
        bail!("Invalid path: {}", path.display())
    }
}

/// Command-line flags take precedence over file and environment settings.
fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(workers) = args.workers {
        config.batch.workers = workers as usize;
    }
    if let Some(timeout) = args.timeout {
        config.backend.timeout_secs = timeout;
    }
    if args.recursive {
        config.batch.recursive = true;
    }
    if args.no_replace {
        config.batch.overwrite_existing = false;
    }
}

async fn convert_file(converter: &FileConverter, input: &Path, args: &Args) -> Result<ExitCode> {
    if !is_legacy_presentation(input) {
        error!("File must have .ppt extension: {}", input.display());
        return Ok(ExitCode::FAILURE);
    }

    converter
        .ensure_backend()
        .await
        .context("Conversion engine unavailable")?;

    let output = resolve_output_path(input, args.output.as_deref());
    let exists = tokio::fs::try_exists(&output).await.unwrap_or(false);

    if args.dry_run {
        if exists && args.no_replace {
            info!("[DRY RUN] Would skip {} - {} already exists", input.display(), output.display());
        } else if exists {
            info!("[DRY RUN] Would replace: {} → {}", input.display(), output.display());
        } else {
            info!("[DRY RUN] Would convert: {} → {}", input.display(), output.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let overwrite = if !exists || args.no_replace {
        false
    } else if args.yes {
        true
    } else {
        warn!("Output file already exists: {}", output.display());
        confirm_replace(&output).await?
    };

    let outcome = converter.convert(input, Some(&output), overwrite).await;
    report_outcome(&outcome);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    Ok(if outcome.success || outcome.is_skip() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Asks before replacing; declines when stdin is not a terminal.
async fn confirm_replace(output: &Path) -> Result<bool> {
    if !std::io::stdin().is_terminal() {
        warn!("Not running interactively; pass -y to replace existing files");
        return Ok(false);
    }

    let prompt = format!("Overwrite {}?", output.display());
    tokio::task::spawn_blocking(move || {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
    })
    .await
    .context("Prompt task failed")?
    .context("Failed to read confirmation")
}

fn report_outcome(outcome: &ConversionOutcome) {
    if outcome.success {
        info!("{}", outcome.message);
    } else if outcome.is_skip() {
        info!("Skipping conversion: {}", outcome.message);
    } else {
        error!("{}", outcome.message);
    }
}

async fn convert_directory(
    converter: FileConverter,
    directory: &Path,
    config: &Config,
    args: &Args,
) -> Result<ExitCode> {
    if args.output.is_some() {
        warn!("--output is ignored when converting a directory");
    }

    let options = config.batch.options().with_dry_run(args.dry_run);
    let orchestrator = BatchOrchestrator::new(converter);
    let report = orchestrator
        .run(directory, &options)
        .await
        .with_context(|| format!("Batch conversion of {} failed", directory.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report.summary)?);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
