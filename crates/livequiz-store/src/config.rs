//! Store configuration from defaults, environment or YAML.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Upper bound accepted for `busy_timeout_ms` (ten minutes).
pub const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

/// SQLite store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database file. `None` opens a private in-memory database.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// How long a statement waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Use write-ahead logging for file-backed databases.
    #[serde(default = "default_wal")]
    pub wal: bool,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_wal() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
            wal: default_wal(),
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("database path must not be empty")]
    EmptyPath,

    #[error("busy timeout {given}ms exceeds the maximum of {max}ms")]
    BusyTimeoutTooLarge { given: u64, max: u64 },
}

impl StoreConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `LIVEQUIZ_DB_PATH` | Database file (unset or empty: in-memory) |
    /// | `LIVEQUIZ_DB_BUSY_TIMEOUT_MS` | Busy timeout in milliseconds |
    /// | `LIVEQUIZ_DB_WAL` | `1`/`true` to enable WAL, anything else disables it |
    pub fn from_env() -> Self {
        Self {
            path: std::env::var("LIVEQUIZ_DB_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            busy_timeout_ms: std::env::var("LIVEQUIZ_DB_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_busy_timeout_ms),
            wal: std::env::var("LIVEQUIZ_DB_WAL")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or_else(|_| default_wal()),
        }
    }

    /// Parse a YAML document; missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("invalid store config")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read store config {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self
            .path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(ConfigError::EmptyPath);
        }
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::BusyTimeoutTooLarge {
                given: self.busy_timeout_ms,
                max: MAX_BUSY_TIMEOUT_MS,
            });
        }
        Ok(())
    }

    /// Set the database file.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Use an in-memory database.
    pub fn in_memory(mut self) -> Self {
        self.path = None;
        self
    }

    pub fn with_busy_timeout_ms(mut self, ms: u64) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }
}
