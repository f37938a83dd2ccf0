//! Store configuration via `clinicdb.toml`
//!
//! Connection settings are carried for the caller and exposed read-only.
//! The in-process backend ignores them; a network backend would use them
//! to open and authenticate its session.

use super::retry::RetryConfig;
use clinicdb_core::{Error, Result, StoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "clinicdb.toml";

/// Default full-text index for patient condition search
pub const DEFAULT_SEARCH_INDEX: &str = "medical-condition";

/// Backing store connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Cluster address, e.g. `couchbase://127.0.0.1`
    #[serde(default = "default_address")]
    pub address: String,
    /// Bucket holding every document of this system
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Username
    #[serde(default = "default_username")]
    pub username: String,
    /// Password
    #[serde(default = "default_password")]
    pub password: String,
}

fn default_address() -> String {
    "couchbase://127.0.0.1".to_string()
}

fn default_bucket() -> String {
    "default".to_string()
}

fn default_username() -> String {
    "demo".to_string()
}

fn default_password() -> String {
    "123456".to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            bucket: default_bucket(),
            username: default_username(),
            password: default_password(),
        }
    }
}

/// Search settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    /// Index used by patient condition search
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_index() -> String {
    DEFAULT_SEARCH_INDEX.to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
        }
    }
}

/// Store configuration loaded from `clinicdb.toml`
///
/// # Example
///
/// ```toml
/// [connection]
/// address = "couchbase://127.0.0.1"
/// bucket = "default"
///
/// [retry]
/// max_retries = 5
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Backing store connection
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Full-text search
    #[serde(default)]
    pub search: SearchConfig,
    /// CAS conflict retry
    #[serde(default)]
    pub retry: RetryConfig,
}

impl StoreConfig {
    /// Check values that parse but cannot be used
    ///
    /// # Errors
    ///
    /// `ValidationFailed` on an empty bucket or index name, or a retry
    /// base delay larger than its maximum.
    pub fn validate(&self) -> Result<()> {
        if self.connection.bucket.trim().is_empty() {
            return Err(Error::validation("connection.bucket must not be empty"));
        }
        if self.search.index.trim().is_empty() {
            return Err(Error::validation("search.index must not be empty"));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::validation(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# clinicdb configuration

# Backing document store. The in-process store ignores these values.
[connection]
address = "couchbase://127.0.0.1"
bucket = "default"
username = "demo"
password = "123456"

# Full-text index used by patient condition search
[search]
index = "medical-condition"

# Retry of read-modify-write on CAS conflict (exponential backoff)
[retry]
max_retries = 3
base_delay_ms = 10
max_delay_ms = 100
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::internal(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: StoreConfig = toml::from_str(&content).map_err(|e| {
            Error::validation(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        debug!(target: "clinicdb::config", path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                StoreError::internal(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            debug!(target: "clinicdb::config", path = %path.display(), "wrote default config");
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| StoreError::internal(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            StoreError::internal(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
            .into()
        })
    }
}
