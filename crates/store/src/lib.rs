//! Content memory store backed by a single SQLite file
//!
//! Persists generated artifacts (drafts, research results, plans, analyses),
//! serves retrieval, filtered search and statistics over them, and reclaims
//! expired items with a periodic sweep.
//!
//! # Example
//!
//! ```ignore
//! use stash_core::StoreConfig;
//! use stash_store::{MemoryServer, NewContent, api};
//!
//! let server = MemoryServer::start(&StoreConfig::default()).await?;
//!
//! let id = api::store_content(
//!     &server,
//!     NewContent::new("presentation", "Q3 Review", deck_json)
//!         .with_tags(["q3", "finance"])
//!         .with_client_id("acme")
//!         .with_ttl_days(30),
//! )
//! .await?;
//!
//! for hit in api::search_content(&server, "revenue", None, None, None, Some("acme")).await {
//!     println!("{} {} (score: {:.1})", hit.id, hit.title, hit.relevance_score);
//! }
//!
//! server.shutdown().await;
//! ```

pub mod api;
mod database;
mod error;
mod item;
mod migration;
mod query;
mod schema;
mod server;

pub use database::{MemoryDatabase, StoreStats};
pub use error::{Error, Result};
pub use item::{Decoded, MemoryItem, Metadata, content_size, fingerprint};
pub use migration::MigrationManager;
pub use query::{DEFAULT_MAX_RESULTS, MemoryQuery, Predicate, SortBy};
pub use schema::{INDEX_NAMES, SCHEMA_VERSION};
pub use server::{MemoryServer, MemoryStats, NewContent, SearchPreview, SweeperState, relevance_score, truncate_preview};
