//! Logging setup for stash processes.
//!
//! Built on the tracing ecosystem: an env-driven filter, a formatted stderr
//! layer and an optional daily-rolling JSON file layer.
//!
//! # Environment Variables
//!
//! - `STASH_LOG`: Filter directive (like `RUST_LOG`), e.g., `stash_store=debug`
//! - `STASH_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `STASH_LOG_DIR`: Directory for file logs (default `~/.stash/logs/`)
//!
//! # Example
//!
//! ```no_run
//! use stash_core::logging::{self, LogFormat, LoggingConfig};
//!
//! logging::init_logging(Some(LoggingConfig::new().with_level("info").with_format(LogFormat::Compact)))?;
//! # Ok::<(), stash_core::Error>(())
//! ```

use crate::Error;
use crate::config::{FileLoggingConfig, LoggingConfig as ConfigLoggingConfig};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    /// All available log formats.
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    /// Parse a log format from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    /// Get the string representation of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// Runtime logging settings, bridged from the `[logging]` config section.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level for stderr output.
    pub level: String,
    /// Output format for stderr; `None` means detect from the terminal.
    pub format: Option<LogFormat>,
    /// File logging configuration (optional).
    pub file: Option<FileLoggingConfig>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: None, file: None }
    }
}

impl From<ConfigLoggingConfig> for LoggingConfig {
    fn from(config: ConfigLoggingConfig) -> Self {
        Self {
            level: config.level,
            format: LogFormat::parse_str(&config.format),
            file: if config.file.enabled { Some(config.file) } else { None },
        }
    }
}

impl LoggingConfig {
    /// Create a new logging config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Enable file logging.
    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file = Some(config);
        self
    }

    /// Pick the filter directive: `STASH_LOG`, then `RUST_LOG`, then the configured level.
    fn filter_directive(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        lookup("STASH_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| self.level.clone())
    }

    /// Build an EnvFilter from this config and environment variables.
    fn build_env_filter(&self) -> EnvFilter {
        let directive = self.filter_directive(|key| env::var(key).ok());
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(&self.level))
    }

    /// Filter for the file layer, independent of the stderr filter.
    fn build_file_filter(file: &FileLoggingConfig) -> EnvFilter {
        EnvFilter::try_new(&file.level).unwrap_or_else(|_| EnvFilter::new(FileLoggingConfig::default().level))
    }

    /// Detect if stderr is a TTY for pretty formatting.
    fn is_tty() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    /// Determine the appropriate format for stderr output.
    fn detect_format(&self) -> LogFormat {
        if let Ok(fmt_str) = env::var("STASH_LOG_FORMAT")
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        if let Some(format) = self.format {
            return format;
        }

        if Self::is_tty() { LogFormat::Pretty } else { LogFormat::Compact }
    }

    /// Get the log directory path.
    fn get_log_dir() -> Result<PathBuf, Error> {
        if let Ok(custom_dir) = env::var("STASH_LOG_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }

        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;

        Ok(PathBuf::from(home).join(".stash").join("logs"))
    }
}

/// JSON file layer, generic over the subscriber it is stacked on.
fn json_file_layer<S>(writer: NonBlocking, filter: EnvFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer().json().with_writer(writer).with_filter(filter)
}

/// Initialize the global tracing subscriber.
///
/// Returns the file writer guard when file logging is enabled; keep it alive
/// for the lifetime of the process so buffered lines are flushed.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<Option<WorkerGuard>, Error> {
    let config = config.unwrap_or_default();
    let env_filter = config.build_env_filter();
    let format = config.detect_format();

    let registry = Registry::default();

    if let Some(file) = &config.file {
        let log_dir = LoggingConfig::get_log_dir()?;
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| Error::Config(format!("Failed to create log directory: {}", e)))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "stash.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let file_filter = LoggingConfig::build_file_filter(file);

        let result = match format {
            LogFormat::Pretty => registry
                .with(fmt::layer().pretty().with_writer(io::stderr).with_ansi(true).with_filter(env_filter))
                .with(json_file_layer(non_blocking, file_filter))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(io::stderr).with_filter(env_filter))
                .with(json_file_layer(non_blocking, file_filter))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_writer(io::stderr).with_filter(env_filter))
                .with(json_file_layer(non_blocking, file_filter))
                .try_init(),
        };
        result.map_err(|e| Error::Other(format!("Failed to install subscriber: {}", e)))?;
        Ok(Some(guard))
    } else {
        let result = match format {
            LogFormat::Pretty => registry
                .with(fmt::layer().pretty().with_writer(io::stderr).with_ansi(true).with_filter(env_filter))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(io::stderr).with_filter(env_filter))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_writer(io::stderr).with_filter(env_filter))
                .try_init(),
        };
        result.map_err(|e| Error::Other(format!("Failed to install subscriber: {}", e)))?;
        Ok(None)
    }
}
