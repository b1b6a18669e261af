use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, PartialEq)]
#[command(name = "gitpane")]
#[command(about = "A terminal Git client: commit log, diffs, staging and stashes")]
pub struct CliArgs {
    /// Repository to open (defaults to the most recently opened one, then the current directory)
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl CliArgs {
    pub fn options(&self) -> gitpane_app::runtime::Options {
        gitpane_app::runtime::Options {
            repo: self.repo.clone(),
            config_path: self.config.clone(),
        }
    }
}
