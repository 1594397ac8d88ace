//! CLI argument definitions using clap
//!
//! Commands:
//! - authors-api init --config <path> [--data-dir <dir>]
//! - authors-api serve --config <path> [--port <n>] [--in-memory]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Authors and their books over HTTP
#[derive(Parser, Debug)]
#[command(name = "authors-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a config file and create the data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./authors.json")]
        config: PathBuf,

        /// Data directory for the write-ahead log
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Start the HTTP server
    Serve {
        /// Path to configuration file (defaults apply if it does not exist)
        #[arg(long, default_value = "./authors.json")]
        config: PathBuf,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,

        /// Ignore the configured data directory and keep everything in memory
        #[arg(long)]
        in_memory: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
