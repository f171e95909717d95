//! Store configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;

use crate::pool::DbConfig;
use crate::query::SortPolicy;

const DEFAULT_DB_PATH: &str = "./storehub.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// SQLite database file (`STOREHUB_DB_PATH`)
    pub database_path: PathBuf,

    /// Pool size (`STOREHUB_DB_MAX_CONNECTIONS`)
    pub max_connections: u32,

    /// Reject unknown sort inputs instead of falling back (`STOREHUB_STRICT_SORT`)
    pub strict_sort: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            strict_sort: false,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = StoreConfig {
            database_path: lookup("STOREHUB_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),

            max_connections: lookup("STOREHUB_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| DEFAULT_MAX_CONNECTIONS.to_string())
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("STOREHUB_DB_MAX_CONNECTIONS".to_string()))?,

            strict_sort: match lookup("STOREHUB_STRICT_SORT") {
                None => false,
                Some(raw) => parse_bool(&raw)
                    .ok_or_else(|| ConfigError::InvalidValue("STOREHUB_STRICT_SORT".to_string()))?,
            },
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "STOREHUB_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(config)
    }

    /// Pool configuration for [`crate::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone())
            .max_connections(self.max_connections)
            .sort_policy(self.sort_policy())
    }

    pub fn sort_policy(&self) -> SortPolicy {
        if self.strict_sort {
            SortPolicy::Strict
        } else {
            SortPolicy::Fallback
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
