//! Schema migration logic for the memory store
//!
//! Tracks applied migrations and applies pending ones up to the current schema version.

use crate::error::{Error, Result};
use crate::schema::{SCHEMA_SQL, SCHEMA_VERSION};
use rusqlite::Connection;
use tracing::{debug, info, trace};

/// Ordered schema steps; the last version must equal [`SCHEMA_VERSION`]
const MIGRATIONS: &[(i32, &str)] = &[(1, SCHEMA_SQL)];

/// Manages schema migrations for the memory store
pub struct MigrationManager;

impl MigrationManager {
    /// Get the current schema version from the database
    ///
    /// Returns 0 if the schema_version table doesn't exist or is empty.
    pub fn get_current_version(conn: &Connection) -> Result<i32> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(format!("Failed to check schema_version table: {e}")))?;

        if !table_exists {
            trace!("schema_version table does not exist, returning version 0");
            return Ok(0);
        }

        let version: Option<i32> = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to query schema version: {e}")))?;

        Ok(version.unwrap_or(0))
    }

    /// Apply pending migrations up to SCHEMA_VERSION
    ///
    /// Each step runs in its own transaction together with its version row,
    /// so an interrupted upgrade resumes at the first missing step.
    pub fn migrate(conn: &mut Connection) -> Result<()> {
        let current_version = Self::get_current_version(conn)?;
        debug!("Current schema version: {}, target: {}", current_version, SCHEMA_VERSION);

        let pending: Vec<_> = MIGRATIONS.iter().filter(|(version, _)| *version > current_version).collect();
        if pending.is_empty() {
            trace!("Schema is up to date, no migration needed");
            return Ok(());
        }

        for (version, sql) in pending {
            info!("Applying schema migration v{}", version);
            let tx = conn
                .transaction()
                .map_err(|e| Error::database(format!("Failed to begin migration v{version}: {e}")))?;
            tx.execute_batch(sql)
                .map_err(|e| Error::database(format!("Failed to apply migration v{version}: {e}")))?;
            tx.execute("INSERT OR IGNORE INTO schema_version (version) VALUES (?1)", [version])
                .map_err(|e| Error::database(format!("Failed to record migration v{version}: {e}")))?;
            tx.commit()
                .map_err(|e| Error::database(format!("Failed to commit migration v{version}: {e}")))?;
        }

        info!("Schema migration complete");
        Ok(())
    }
}
