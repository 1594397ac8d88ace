//! Configuration file
//!
//! ```json
//! {
//!   "data_dir": "./data",
//!   "log_level": "info",
//!   "server": { "host": "0.0.0.0", "port": 5001, "cors_origins": [] }
//! }
//! ```
//!
//! Every field is optional. Without `data_dir` the store is in-memory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::http_server::HttpServerConfig;
use crate::observability::LOG_LEVELS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory holding the WAL; `None` keeps the store in memory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Log filter level (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: HttpServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: default_log_level(),
            server: HttpServerConfig::default(),
        }
    }
}

impl Config {
    /// Load and validate a config file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> CliResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.server.port == 0 {
            return Err(CliError::config_error("server.port must be > 0"));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        if let Some(dir) = &self.data_dir {
            if dir.as_os_str().is_empty() {
                return Err(CliError::config_error("data_dir must not be empty"));
            }
        }

        Ok(())
    }

    /// Write as pretty JSON
    pub fn save(&self, path: &Path) -> CliResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")?;
        Ok(())
    }
}
