//! Error types for the content memory store

use std::path::PathBuf;
use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the memory store
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database corruption or schema mismatch
    #[error("Database error: {0}")]
    Database(String),

    /// Data directory could not be prepared
    #[error("Cannot create data directory {path}: {source}")]
    DataDir { path: PathBuf, source: std::io::Error },

    /// The persistence engine reported a failed write
    #[error("Failed to store item: id={id}")]
    StoreFailed { id: String },

    #[error("Connection error: {0}")]
    ConnectionError(#[from] tokio_rusqlite::Error),
}

impl Error {
    /// Create a database error with a message
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a store failure error for the given item id
    pub fn store_failed(id: impl Into<String>) -> Self {
        Self::StoreFailed { id: id.into() }
    }
}
