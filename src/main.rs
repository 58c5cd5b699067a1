mod analysis;
mod catalog;
mod cli;
mod config;
mod logging;
mod store;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use dotenvy::dotenv;
use tracing::{info, warn};

use crate::catalog::DuplicateQuotePolicy;
use crate::config::AppConfig;
use crate::logging::init_logging;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "pcmp",
    version,
    about = "Record supplier quotes per inquiry round and compare prices across rounds"
)]
pub struct Cli {
    /// Directory holding the table files (env PCMP_DATA_DIR)
    #[arg(long, global = true)]
    pub(crate) data_dir: Option<PathBuf>,

    /// Log level (error,warn,info,debug,trace)
    #[arg(long, global = true)]
    pub(crate) log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub(crate) log_file: Option<PathBuf>,

    /// What to do when a project already has a quote for a product (allow, reject)
    #[arg(long, global = true)]
    pub(crate) duplicate_quotes: Option<DuplicateQuotePolicy>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub(crate) json: bool,

    #[command(subcommand)]
    pub(crate) command: cli::Command,
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let cfg = AppConfig::from_cli(&cli)?;
    init_logging(&cfg.log_level, cfg.log_file.as_deref())?;
    for warning in &cfg.warnings {
        warn!("{warning}");
    }
    info!(?cfg, "app config");

    let mut stdout = io::stdout().lock();
    cli::run(&cfg, cli.command, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
