//! # Engine Configuration
//!
//! Settings for one register: where the database lives, how many pooled
//! connections it gets, which terminal it is and the sales tax it charges.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CAFE_DB_PATH=/srv/cafe/cafe.db                                     │
//! │     CAFE_TAX_RATE_BPS=1200                                             │
//! │     CAFE_TERMINAL_ID=pos-02                                            │
//! │     CAFE_MAX_CONNECTIONS=4                                             │
//! │     CAFE_STORE_NAME="Corner Beans"                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cafe-pos/engine.toml (Linux)                             │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     database in the platform data dir, 0% tax, terminal "pos-01"       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/cafe/cafe.db"
//! max_connections = 5
//! busy_timeout_secs = 5
//!
//! [terminal]
//! id = "pos-02"
//!
//! [store]
//! name = "Corner Beans"
//! tax_rate_bps = 1200
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use cafe_core::validation::validate_tax_rate_bps;
use cafe_core::TaxRate;

use crate::pool::DbConfig;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not determine the application data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. `None` resolves to the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,

    /// How long a caller waits for a pooled connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_min_connections() -> u32 {
    1
}

fn default_busy_timeout() -> u64 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            busy_timeout_secs: default_busy_timeout(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalSettings {
    /// Recorded on every sale this register commits.
    #[serde(default = "default_terminal_id")]
    pub id: String,
}

fn default_terminal_id() -> String {
    "pos-01".to_string()
}

impl Default for TerminalSettings {
    fn default() -> Self {
        TerminalSettings {
            id: default_terminal_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Sales tax in basis points (1200 = 12%), applied to the order subtotal.
    #[serde(default)]
    pub tax_rate_bps: u32,
}

fn default_store_name() -> String {
    "Cafe".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
            tax_rate_bps: 0,
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub terminal: TerminalSettings,

    #[serde(default)]
    pub store: StoreSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, or `engine.toml` in the config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = EngineConfig::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `CAFE_*` overrides from `lookup` (the process environment in
    /// production). Unparseable values are errors, not silently ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CAFE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(bps) = lookup("CAFE_TAX_RATE_BPS") {
            self.store.tax_rate_bps = bps
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("CAFE_TAX_RATE_BPS", format!("'{}' is not a whole number", bps)))?;
        }

        if let Some(id) = lookup("CAFE_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal id from environment");
            self.terminal.id = id;
        }

        if let Some(max) = lookup("CAFE_MAX_CONNECTIONS") {
            self.database.max_connections = max
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("CAFE_MAX_CONNECTIONS", format!("'{}' is not a whole number", max)))?;
        }

        if let Some(name) = lookup("CAFE_STORE_NAME") {
            self.store.name = name;
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_tax_rate_bps(self.store.tax_rate_bps)
            .map_err(|e| ConfigError::invalid("store.tax_rate_bps", e.to_string()))?;

        if self.terminal.id.trim().is_empty() {
            return Err(ConfigError::invalid("terminal.id", "must not be empty"));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid("database.max_connections", "must be greater than 0"));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::invalid(
                "database.min_connections",
                "must not exceed max_connections",
            ));
        }

        Ok(())
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.store.tax_rate_bps)
    }

    pub fn terminal_id(&self) -> &str {
        &self.terminal.id
    }

    /// Resolved database file: the configured path, or `cafe.db` in the
    /// platform data directory (created if missing).
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "cafe", "pos").ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Read {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join("cafe.db"))
    }

    /// Builds the pool configuration.
    pub fn db_config(&self) -> ConfigResult<DbConfig> {
        Ok(DbConfig::new(self.database_path()?)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
            .connect_timeout(Duration::from_secs(self.database.acquire_timeout_secs)))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cafe", "pos").map(|dirs| dirs.config_dir().join("engine.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.terminal_id(), "pos-01");
        assert_eq!(config.tax_rate(), TaxRate::zero());
        assert_eq!(config.database.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_sections_with_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [store]
            name = "Corner Beans"
            tax_rate_bps = 1200

            [database]
            path = "/tmp/cafe-test.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.name, "Corner Beans");
        assert_eq!(config.tax_rate().bps(), 1200);
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/cafe-test.db")));
        assert_eq!(config.database.busy_timeout_secs, 5);
        assert_eq!(config.terminal_id(), "pos-01");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config: EngineConfig = toml::from_str("[store]\ntax_rate_bps = 500\n").unwrap();
        config
            .apply_overrides(env(&[
                ("CAFE_TAX_RATE_BPS", "1200"),
                ("CAFE_TERMINAL_ID", "pos-07"),
                ("CAFE_DB_PATH", "/tmp/other.db"),
            ]))
            .unwrap();

        assert_eq!(config.tax_rate().bps(), 1200);
        assert_eq!(config.terminal_id(), "pos-07");
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_bad_env_value_is_an_error() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides(env(&[("CAFE_MAX_CONNECTIONS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CAFE_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_validation() {
        let mut config = EngineConfig::default();
        config.store.tax_rate_bps = 20_000;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.terminal.id = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.database.min_connections = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_db_config_from_settings() {
        let mut config = EngineConfig::default();
        config.database.path = Some(PathBuf::from("/tmp/cafe-pool.db"));
        config.database.max_connections = 3;

        let db = config.db_config().unwrap();
        assert_eq!(db.database_path, PathBuf::from("/tmp/cafe-pool.db"));
        assert_eq!(db.max_connections, 3);
        assert_eq!(db.busy_timeout, Duration::from_secs(5));
    }
}
