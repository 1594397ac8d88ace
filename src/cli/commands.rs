//! CLI command implementations
//!
//! `serve` boot sequence:
//! 1. Load config (defaults if the file is absent)
//! 2. Initialise logging
//! 3. Open the store, replaying the WAL when durable
//! 4. Serve until Ctrl-C

use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliResult};
use crate::http_server::{AuthorsState, HttpServer};
use crate::observability::{init_logging, log_event, log_event_with_fields, Event};
use crate::store::CatalogStore;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config, data_dir } => init(&config, &data_dir),
        Command::Serve {
            config,
            port,
            in_memory,
        } => serve(&config, port, in_memory),
    }
}

/// Write a config pointing at `data_dir` and create the directory.
pub fn init(config_path: &Path, data_dir: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path));
    }

    fs::create_dir_all(data_dir).map_err(|e| {
        CliError::io_error(format!(
            "Failed to create data directory {}: {}",
            data_dir.display(),
            e
        ))
    })?;

    let config = Config {
        data_dir: Some(data_dir.to_path_buf()),
        ..Default::default()
    };
    config.save(config_path)?;

    println!("Wrote {}", config_path.display());
    println!("Data directory {}", data_dir.display());
    Ok(())
}

/// Resolve the effective config for `serve`
pub fn resolve_config(config_path: &Path, port: Option<u16>, in_memory: bool) -> CliResult<Config> {
    let mut config = Config::load_or_default(config_path)?;
    if let Some(port) = port {
        config.server.port = port;
    }
    if in_memory {
        config.data_dir = None;
    }
    config.validate()?;
    Ok(config)
}

/// Open the store described by `config`
pub fn open_store(config: &Config) -> CliResult<CatalogStore> {
    match &config.data_dir {
        Some(dir) => {
            let store = CatalogStore::open(dir)?;
            let stats = store.stats()?;
            log_event_with_fields(
                Event::WalReplayed,
                &[
                    ("data_dir", dir.display().to_string().as_str()),
                    ("authors", stats.authors.to_string().as_str()),
                    ("books", stats.books.to_string().as_str()),
                ],
            );
            Ok(store)
        }
        None => Ok(CatalogStore::in_memory()),
    }
}

pub fn serve(config_path: &Path, port: Option<u16>, in_memory: bool) -> CliResult<()> {
    let config = resolve_config(config_path, port, in_memory)?;

    init_logging(&config.log_level);
    log_event(Event::BootStart);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("addr", config.server.socket_addr().as_str()),
            ("durable", if config.data_dir.is_some() { "true" } else { "false" }),
        ],
    );

    let store = open_store(&config)?;
    let state = Arc::new(AuthorsState::with_store(store));
    let server = HttpServer::with_state(config.server.clone(), state);

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to start async runtime: {}", e)))?;

    runtime
        .block_on(server.start())
        .map_err(|e| CliError::io_error(format!("Server error: {}", e)))
}
