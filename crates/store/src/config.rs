//! Store configuration.
//!
//! Loaded from the environment by the `stockroom-init` binary; tests build it
//! directly with [`StoreConfig::in_memory`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_DB_PATH: &str = "STOCKROOM_DB_PATH";
pub const ENV_SEED: &str = "STOCKROOM_SEED";
pub const ENV_MAX_CONNECTIONS: &str = "STOCKROOM_MAX_CONNECTIONS";

const DEFAULT_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")]
    NoDataDir,
}

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "path")]
pub enum StoreLocation {
    File(PathBuf),
    /// Private in-memory database; always starts empty.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub location: StoreLocation,
    /// Seed sample categories/products when the store is created.
    pub seed_sample_data: bool,
    pub max_connections: u32,
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    /// File-backed store; seeds sample data when the file does not exist yet.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            seed_sample_data: true,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    /// Empty in-memory store (no sample data).
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            seed_sample_data: false,
            max_connections: 1,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn with_sample_data(mut self, seed: bool) -> Self {
        self.seed_sample_data = seed;
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            StoreLocation::File(path) => Some(path),
            StoreLocation::Memory => None,
        }
    }

    /// Build configuration from `STOCKROOM_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = match lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };
        let mut config = Self::file(path);

        if let Some(value) = lookup(ENV_SEED) {
            config.seed_sample_data = parse_bool(ENV_SEED, &value)?;
        }

        if let Some(value) = lookup(ENV_MAX_CONNECTIONS) {
            let max = value
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: ENV_MAX_CONNECTIONS,
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
            if max == 0 {
                return Err(ConfigError::InvalidValue {
                    key: ENV_MAX_CONNECTIONS,
                    value,
                    reason: "must be at least 1".to_string(),
                });
            }
            config.max_connections = max;
        }

        Ok(config)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}

/// Resolve the default database path: `{app_data_dir}/stockroom/inventory.db`.
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or(ConfigError::NoDataDir)?;

    dir.push("stockroom");
    dir.push("inventory.db");
    Ok(dir)
}
