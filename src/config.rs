//! Index configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "root_data_dir": "/srv/sid/data",
//!   "index_dir": "/var/tmp/sidindex",
//!   "log_dir": "/var/log/sidindex",
//!   "refresh_interval_ms": 600000
//! }
//! ```
//!
//! Only the three directories are required.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_CAPACITY;

pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 600_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory tree holding the data files
    pub root_data_dir: PathBuf,

    /// Where bucket files live
    pub index_dir: PathBuf,

    /// Where per-cycle scan logs are written
    pub log_dir: PathBuf,

    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Buckets kept deserialized in memory; 0 disables the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// First day considered by `days_with_data`
    #[serde(default = "default_history_start")]
    pub history_start: NaiveDate,
}

fn default_refresh_interval_ms() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2003, 1, 1).unwrap_or(NaiveDate::MIN)
}

impl IndexConfig {
    pub fn new(
        root_data_dir: impl Into<PathBuf>,
        index_dir: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root_data_dir: root_data_dir.into(),
            index_dir: index_dir.into(),
            log_dir: log_dir.into(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            history_start: default_history_start(),
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_history_start(mut self, day: NaiveDate) -> Self {
        self.history_start = day;
        self
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: IndexConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root_data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("root_data_dir must be set".into()));
        }
        if self.index_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("index_dir must be set".into()));
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("log_dir must be set".into()));
        }
        if self.refresh_interval_ms == 0 {
            return Err(ConfigError::Invalid("refresh_interval_ms must be > 0".into()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}
