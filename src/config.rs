//! Runtime configuration (`taskboard.toml`).

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_DATA_DIR: &str = "./taskboard-data";
const DEFAULT_LOG_LEVEL: &str = "info";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the SQLite database file.
    pub data_dir: PathBuf,
    /// Tracing filter directive, e.g. `"info"` or `"taskboard=debug"`.
    /// Overridden by `RUST_LOG` when set.
    pub log_level: String,
    /// Slow-query log threshold in milliseconds. 0 disables slow-query logging.
    pub slow_query_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            slow_query_ms: 0,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Install the global tracing subscriber. `RUST_LOG` wins over `log_level`.
    /// Safe to call more than once (subsequent calls are no-ops).
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .try_init();
    }
}
