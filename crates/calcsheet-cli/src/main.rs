use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use calcsheet_cli::{menu, storage};
use calcsheet_engine::Spreadsheet;

/// Minimal spreadsheet calculator with a text menu
#[derive(Parser, Debug)]
#[command(name = "calcsheet", version, about)]
struct Cli {
    /// Sheet file to load at startup
    file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut sheet = match &cli.file {
        Some(path) => {
            let sheet = storage::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("loaded sheet from {}", path.display());
            sheet
        }
        None => Spreadsheet::new(),
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    menu::run(&mut sheet, stdin.lock(), stdout.lock())?;

    Ok(())
}
