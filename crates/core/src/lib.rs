//! Shared plumbing for the stash content memory store: errors, configuration and logging.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, FileLoggingConfig, LoggingConfig, StoreConfig};
pub use error::{Error, Result};
