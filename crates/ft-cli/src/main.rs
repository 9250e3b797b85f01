//! featree entry point

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use ft_core::config::{ConfigError, ExtractConfig};
use ft_core::constants::DEFAULT_CONFIG_FILE;
use ft_core::export::{self, ExportError, default_output_path};
use ft_core::{ExtractError, extract_document};
use ft_session::{CadApplication, MemoryApplication};

#[derive(Parser, Debug)]
#[command(name = "featree")]
#[command(version, about = "Extract a CAD feature tree into a JSON document")]
struct Cli {
    /// Recorded document snapshot (RON or JSON)
    snapshot: PathBuf,

    /// Output file (default: <title>_feature_tree.json next to the snapshot)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extraction config in RON (default: ./featree.ron when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write compact JSON
    #[arg(long)]
    compact: bool,

    /// Deepest sub-feature level to descend into
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Cannot open {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "featree=info,ft_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<PathBuf, CliError> {
    let mut config = match &cli.config {
        Some(path) => ExtractConfig::load(path)?,
        None => ExtractConfig::load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    if cli.compact {
        config.pretty_json = false;
    }
    if cli.max_depth.is_some() {
        config.max_depth = cli.max_depth;
    }

    let app = MemoryApplication::new();
    let session = app
        .open_document(&cli.snapshot)
        .map_err(|e| CliError::Open {
            path: cli.snapshot.clone(),
            message: e.to_string(),
        })?;

    let document = extract_document(session.as_ref(), &config)?;

    let output = match &cli.output {
        Some(path) => path.clone(),
        None => {
            let dir = cli.snapshot.parent().unwrap_or(Path::new("."));
            default_output_path(dir, document.title.as_deref().unwrap_or_default())
        }
    };
    export::save(&document, &output, config.pretty_json)?;

    tracing::info!(
        "{} features ({} sketches) written to {}",
        document.statistics.total_features,
        document.statistics.sketch_count,
        output.display()
    );
    Ok(output)
}
