//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default platform data directory
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Dynamics 365 collection extractor
#[derive(Parser, Debug)]
#[command(name = "dynamics-extractor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding config.json and receiving out/tables
    #[arg(short, long, global = true, env = "KBC_DATADIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Configuration file (JSON or YAML), defaults to <data-dir>/config.json
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Extract the configured endpoint (default)
    Run,

    /// List collections available on the instance
    ListEndpoints,
}

impl Cli {
    /// Subcommand to execute, `run` when none was given
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}
