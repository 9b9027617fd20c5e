use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable overriding `store.data_dir`
pub const DATA_DIR_ENV: &str = "STASH_DATA_DIR";

/// Environment variable overriding `store.sweep_interval_secs`
pub const SWEEP_INTERVAL_ENV: &str = "STASH_SWEEP_INTERVAL_SECS";

/// Storage settings for the content memory store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the database file, created on first use
    pub data_dir: PathBuf,

    /// Database file name inside `data_dir`
    pub db_file: String,

    /// Seconds between two expiration sweeps
    pub sweep_interval_secs: u64,

    /// Result cap applied when a search does not name one
    pub default_max_results: usize,

    /// Number of characters kept in search previews
    pub preview_chars: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            db_file: "memory.db".to_string(),
            sweep_interval_secs: 3600,
            default_max_results: 50,
            preview_chars: 200,
        }
    }
}

impl StoreConfig {
    /// Create a store config rooted at the given data directory
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Set the sweep interval in seconds
    pub fn with_sweep_interval_secs(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }

    /// Full path of the database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    /// Sweep period as a [`std::time::Duration`]
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.db_file.trim().is_empty() {
            return Err(Error::config(ConfigError::EmptyDbFile.to_string()));
        }
        if self.sweep_interval_secs == 0 {
            return Err(Error::config(
                ConfigError::MustBePositive("store.sweep_interval_secs").to_string(),
            ));
        }
        if self.default_max_results == 0 {
            return Err(Error::config(
                ConfigError::MustBePositive("store.default_max_results").to_string(),
            ));
        }
        Ok(())
    }
}

/// File logging section (`[logging.file]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLoggingConfig {
    /// Write JSON logs to the log directory
    pub enabled: bool,
    /// Level for the file layer
    pub level: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self { enabled: false, level: "debug".to_string() }
    }
}

/// Logging section (`[logging]`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default level for stderr output
    pub level: String,
    /// Output format: `pretty`, `json` or `compact`
    pub format: String,
    /// File output
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: "pretty".to_string(), file: FileLoggingConfig::default() }
    }
}

/// Root configuration structure for stash.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Store settings
    pub store: StoreConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from `path` when it exists, defaults otherwise,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup(DATA_DIR_ENV) {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(SWEEP_INTERVAL_ENV) {
            self.store.sweep_interval_secs = raw
                .trim()
                .parse()
                .map_err(|_| Error::config(ConfigError::InvalidNumber(SWEEP_INTERVAL_ENV, raw.clone()).to_string()))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.store.validate()
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# Stash Configuration Example

[store]
# Directory holding the database file (created on first use)
data_dir = "data"
# Database file name inside data_dir
db_file = "memory.db"
# Seconds between expiration sweeps
sweep_interval_secs = 3600
# Search cap when none is given
default_max_results = 50
# Characters kept in search previews
preview_chars = 200

[logging]
# Level for stderr: trace, debug, info, warn, error
level = "warn"
# Output format: "pretty", "json" or "compact"
format = "pretty"

[logging.file]
enabled = false
level = "debug"
"#
    }
}

/// Configuration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Numeric setting must be greater than zero
    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    /// Empty database file name
    #[error("store.db_file must not be empty")]
    EmptyDbFile,

    /// Environment override is not a number
    #[error("{0} is not a valid number: {1}")]
    InvalidNumber(&'static str, String),
}
