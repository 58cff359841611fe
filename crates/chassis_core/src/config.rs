//! Store configuration loading.
//!
//! # Responsibility
//! - Describe where and how the backing store is opened.
//! - Load configuration from a TOML file with sane fallbacks.
//!
//! # Invariants
//! - A missing or malformed configuration file degrades to defaults
//!   instead of failing the caller.
//! - The `CHASSIS_DB_PATH` environment variable overrides the configured
//!   database path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Options for opening the backing store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database file path; `None` opens an in-memory store.
    pub db_path: Option<PathBuf>,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

/// Loads store configuration from a TOML file.
///
/// Missing files and parse failures fall back to [`StoreConfig::default`];
/// a `CHASSIS_DB_PATH` environment override is applied last.
pub fn load_config(path: impl AsRef<Path>) -> StoreConfig {
    let mut config = match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => StoreConfig::default(),
    };

    if let Ok(db_path) = std::env::var("CHASSIS_DB_PATH") {
        config.db_path = Some(PathBuf::from(db_path));
    }

    config
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, DEFAULT_BUSY_TIMEOUT_MS};

    #[test]
    fn default_config_is_in_memory() {
        let config = StoreConfig::default();
        assert!(config.db_path.is_none());
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: StoreConfig = toml::from_str("db_path = \"/tmp/app/store.db\"").unwrap();
        assert_eq!(
            config.db_path.as_deref(),
            Some(std::path::Path::new("/tmp/app/store.db"))
        );
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }
}
