//! CLI module
//!
//! Command-line interface for running the extractor.
//!
//! # Commands
//!
//! - `run` - Extract the configured endpoint (default)
//! - `list-endpoints` - List collections available on the instance

mod commands;
mod runner;

pub use commands::{Cli, Commands, DEFAULT_DATA_DIR};
pub use runner::Runner;
