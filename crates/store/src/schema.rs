//! SQLite schema for the content memory store
//!
//! One `memory_items` table keyed by id, with secondary indexes on
//! content_type, tags, created_at and client_id. `metadata` and `tags`
//! are stored as JSON text.

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create the complete schema
///
/// Includes:
/// - Schema version tracking table
/// - Items table
/// - The four secondary indexes
pub const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Names of the secondary indexes created by [`SCHEMA_SQL`]
pub const INDEX_NAMES: [&str; 4] = [
    "idx_memory_items_content_type",
    "idx_memory_items_tags",
    "idx_memory_items_created_at",
    "idx_memory_items_client_id",
];

/// Column list shared by every statement that reads a whole item
pub const ITEM_COLUMNS: &str = "id, content_type, title, content, metadata, tags, created_at, updated_at, \
     access_count, last_accessed, size_bytes, hash, client_id, expires_at";
