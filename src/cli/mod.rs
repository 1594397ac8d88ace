//! CLI module
//!
//! - init: write a config file and create the data directory
//! - serve: open the store and run the HTTP server

mod args;
mod commands;
mod config;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, open_store, resolve_config, run, run_command, serve};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
