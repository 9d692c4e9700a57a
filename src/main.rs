//! vocabfetch command-line entry point.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use vocabfetch::cli::{self, Cli};
use vocabfetch::config::load_settings;
use vocabfetch::table::TableError;

/// Console logging on stderr plus an append-only log file.
fn init_logging(verbose: bool, log_file: &Path) {
    // Initialize logging based on verbosity
    let default_filter = if verbose {
        "vocabfetch=debug"
    } else {
        "vocabfetch=warn"
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        );

    let file = OpenOptions::new().create(true).append(true).open(log_file);
    let file_layer = match file {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_filter(EnvFilter::new("vocabfetch=info")),
        ),
        Err(e) => {
            eprintln!(
                "{} Cannot open log file '{}': {}",
                style("⚠").yellow(),
                log_file.display(),
                e
            );
            None
        }
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(cli.verbose, &settings.log_file);

    match cli::run(&cli, &settings).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TableError>() {
                Some(TableError::NotFound(path)) => {
                    tracing::error!("Input file not found: {}", path.display());
                }
                Some(TableError::Empty(path)) => {
                    tracing::error!("Input file is empty: {}", path.display());
                }
                _ => tracing::error!("Unexpected error: {:#}", e),
            }
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
