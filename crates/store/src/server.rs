//! Store service: business operations over [`MemoryDatabase`] plus the
//! periodic expiration sweep.
use crate::database::{MemoryDatabase, StoreStats};
use crate::error::{Error, Result};
use crate::item::{MemoryItem, Metadata, exceeds_storage_range};
use crate::query::MemoryQuery;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use stash_core::StoreConfig;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

const PREVIEW_ELLIPSIS: &str = "...";

/// Input for [`MemoryServer::store_content`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContent {
    pub content_type: String,
    pub title: String,
    pub content: String,
    pub metadata: Metadata,
    pub tags: Vec<String>,
    pub client_id: Option<String>,
    /// Days until expiry; `Some(0)` expires immediately
    pub ttl_days: Option<i64>,
}

impl NewContent {
    pub fn new(content_type: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self { content_type: content_type.into(), title: title.into(), content: content.into(), ..Default::default() }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_ttl_days(mut self, ttl_days: i64) -> Self {
        self.ttl_days = Some(ttl_days);
        self
    }

    fn into_item(self, now: DateTime<Utc>) -> MemoryItem {
        let mut item = MemoryItem::new(self.content_type, self.title, self.content, now);
        item.metadata = self.metadata;
        item.tags = self.tags;
        item.client_id = self.client_id;
        // a deadline past year 9999 never arrives
        item.expires_at = self
            .ttl_days
            .and_then(Duration::try_days)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .filter(|deadline| !exceeds_storage_range(*deadline));
        item
    }
}

/// Search hit with a truncated payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPreview {
    pub id: String,
    pub content_type: String,
    pub title: String,
    /// First characters of the payload, `...`-terminated when cut
    pub content: String,
    pub metadata: Metadata,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub access_count: u64,
    pub last_accessed: DateTime<Utc>,
    pub size_bytes: u64,
    pub hash: String,
    pub client_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// Popularity proxy: `access_count / 10`, capped at 1.0
    pub relevance_score: f64,
}

impl SearchPreview {
    fn from_item(item: MemoryItem, preview_chars: usize) -> Self {
        Self {
            relevance_score: relevance_score(item.access_count),
            content: truncate_preview(&item.content, preview_chars),
            id: item.id,
            content_type: item.content_type,
            title: item.title,
            metadata: item.metadata,
            tags: item.tags,
            created_at: item.created_at,
            updated_at: item.updated_at,
            access_count: item.access_count,
            last_accessed: item.last_accessed,
            size_bytes: item.size_bytes,
            hash: item.hash,
            client_id: item.client_id,
            expires_at: item.expires_at,
        }
    }
}

/// Popularity proxy attached to search hits
pub fn relevance_score(access_count: u64) -> f64 {
    (access_count as f64 / 10.0).min(1.0)
}

/// Keep the first `max_chars` characters, marking a cut with `...`
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &content[..cut], PREVIEW_ELLIPSIS),
        None => content.to_string(),
    }
}

/// Aggregate view returned by [`MemoryServer::get_memory_stats`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_items: usize,
    pub type_counts: HashMap<String, usize>,
    pub total_size_bytes: u64,
    /// Megabytes (1024 * 1024 bytes), rounded to two decimals
    pub total_size_mb: f64,
    /// Set instead of counts when aggregation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MemoryStats {
    fn failed(message: impl Into<String>) -> Self {
        Self { error: Some(message.into()), ..Default::default() }
    }
}

impl From<StoreStats> for MemoryStats {
    fn from(stats: StoreStats) -> Self {
        let megabytes = stats.total_size_bytes as f64 / (1024.0 * 1024.0);
        Self {
            total_items: stats.total_items,
            type_counts: stats.type_counts,
            total_size_bytes: stats.total_size_bytes,
            total_size_mb: (megabytes * 100.0).round() / 100.0,
            error: None,
        }
    }
}

/// Whether the background sweep is still scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    Running,
    Stopped,
}

/// Owner of the database handle and the expiration sweeper
///
/// Construct one per process and share it (e.g. behind an `Arc`) with every
/// caller of the [`crate::api`] functions.
pub struct MemoryServer {
    db: MemoryDatabase,
    preview_chars: usize,
    default_max_results: usize,
    cancel: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryServer {
    /// Open the configured database and start the sweeper
    ///
    /// Must be called from within a tokio runtime.
    #[instrument(skip_all, fields(db_path = %config.db_path().display()))]
    pub async fn start(config: &StoreConfig) -> Result<Self> {
        let db = MemoryDatabase::open(&config.db_path()).await?;
        let server = Self::with_database(db, config);
        server.spawn_sweeper(config.sweep_interval());
        Ok(server)
    }

    /// Open a database at an explicit path, without a sweeper
    pub async fn open_without_sweeper(db_path: &Path, config: &StoreConfig) -> Result<Self> {
        let db = MemoryDatabase::open(db_path).await?;
        Ok(Self::with_database(db, config))
    }

    fn with_database(db: MemoryDatabase, config: &StoreConfig) -> Self {
        Self {
            db,
            preview_chars: config.preview_chars,
            default_max_results: config.default_max_results,
            cancel: CancellationToken::new(),
            sweeper: Mutex::new(None),
        }
    }

    fn spawn_sweeper(&self, period: std::time::Duration) {
        let db = self.db.clone();
        let cancel = self.cancel.clone();
        let period = period.max(std::time::Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            tracing::info!("Expiration sweeper started, period {:?}", period);
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let removed = db.sweep_expired().await;
                        tracing::debug!("Periodic sweep removed {} items", removed);
                    }
                }
            }
            tracing::info!("Expiration sweeper stopped");
        });

        if let Ok(mut slot) = self.sweeper.lock() {
            *slot = Some(handle);
        }
    }

    /// Current sweeper state
    pub fn sweeper_state(&self) -> SweeperState {
        let running = self
            .sweeper
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false);
        if running { SweeperState::Running } else { SweeperState::Stopped }
    }

    /// Cancel the sweeper and wait for it to exit; safe to call repeatedly
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.sweeper.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!("Sweeper task ended abnormally: {}", e);
        }
    }

    /// The persistence engine behind this service
    pub fn database(&self) -> &MemoryDatabase {
        &self.db
    }

    /// Persist a new artifact and return its id
    ///
    /// Fails only when the database rejects the write.
    #[instrument(skip(self, new), fields(content_type = %new.content_type, client_id = ?new.client_id))]
    pub async fn store_content(&self, new: NewContent) -> Result<String> {
        let item = new.into_item(Utc::now());
        if !self.db.store(&item).await {
            return Err(Error::store_failed(item.id));
        }
        tracing::info!("Stored {} item {} ({} bytes)", item.content_type, item.id, item.size_bytes);
        Ok(item.id)
    }

    /// Full item for `id`, counting the access
    pub async fn retrieve_content(&self, id: &str) -> Option<MemoryItem> {
        self.db.retrieve(id).await
    }

    /// Preview search over free text with optional type, tag and client filters
    ///
    /// `max_results` of `None` uses the configured default.
    pub async fn search_content(
        &self, query: &str, content_type: Option<&str>, tags: Option<&[String]>, max_results: Option<usize>,
        client_id: Option<&str>,
    ) -> Vec<SearchPreview> {
        let mut request = MemoryQuery::new(query).with_max_results(max_results.unwrap_or(self.default_max_results));
        request.content_type = content_type.map(str::to_owned);
        request.tags = tags.map(<[String]>::to_vec);
        request.client_id = client_id.map(str::to_owned);
        self.search(&request).await
    }

    /// Preview search with the full query model (date range, sort order)
    pub async fn search(&self, query: &MemoryQuery) -> Vec<SearchPreview> {
        self.db
            .search(query)
            .await
            .into_iter()
            .map(|item| SearchPreview::from_item(item, self.preview_chars))
            .collect()
    }

    /// Remove an item; `true` when it existed
    pub async fn delete_content(&self, id: &str) -> bool {
        self.db.delete(id).await
    }

    /// Counts and sizes, optionally scoped to one client
    pub async fn get_memory_stats(&self, client_id: Option<&str>) -> MemoryStats {
        match self.db.stats(client_id).await {
            Ok(stats) => stats.into(),
            Err(e) => {
                tracing::error!("Failed to compute memory stats: {}", e);
                MemoryStats::failed(e.to_string())
            }
        }
    }

    /// Run one expiration sweep now; returns the number of items removed
    pub async fn sweep_now(&self) -> usize {
        self.db.sweep_expired().await
    }
}

impl Drop for MemoryServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
