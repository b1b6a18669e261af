use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::CliArgs;

/// The TUI owns stdout, so logs go to a file when one is given
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_file.as_deref())?;

    info!("Starting gitpane");
    gitpane_app::runtime::run(args.options()).await
}
