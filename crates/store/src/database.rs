//! SQLite persistence engine for stored items
//!
//! Every statement runs on the connection's background thread, so a slow scan
//! never blocks the async scheduler. Public operations other than [`MemoryDatabase::open`]
//! never return errors: failures are logged and reported as `false`, `None`,
//! an empty list or a zero count.
use crate::error::{Error, Result};
use crate::item::{MemoryItem, decode_metadata, decode_tags, format_timestamp, parse_timestamp};
use crate::migration::MigrationManager;
use crate::query::MemoryQuery;
use crate::schema::ITEM_COLUMNS;

use chrono::{DateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{OptionalExtension, Row, params, params_from_iter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_rusqlite::Connection;
use tracing::instrument;

/// Raw aggregates over stored items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_items: usize,
    pub type_counts: HashMap<String, usize>,
    pub total_size_bytes: u64,
}

/// A handle to the item table in a single SQLite file
#[derive(Clone)]
pub struct MemoryDatabase {
    conn: Arc<Connection>,
    path: PathBuf,
}

impl MemoryDatabase {
    /// Open or create the database at the given path
    ///
    /// Creates the parent directory, the items table and its indexes when
    /// absent. This is the only operation whose failure is returned: the store
    /// cannot run without a writable file.
    #[instrument(skip_all, fields(db_path = %db_path.display()))]
    pub async fn open(db_path: &Path) -> Result<Self> {
        tracing::info!("Opening memory database at {}", db_path.display());

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|source| Error::DataDir { path: parent.to_path_buf(), source })?;
        }

        let conn = Connection::open(db_path)
            .await
            .map_err(|e| Error::database(format!("Failed to open database: {e}")))?;

        conn.call(|conn| {
            tracing::debug!("Running migrations");
            MigrationManager::migrate(conn).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            tracing::trace!("Migrations complete");
            Ok::<(), rusqlite::Error>(())
        })
        .await
        .map_err(|e| Error::database(format!("Migration failed: {e}")))?;

        tracing::info!("Memory database opened successfully");
        Ok(Self { conn: Arc::new(conn), path: db_path.to_path_buf() })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert the item, or replace every column of the row with the same id
    #[instrument(skip(self, item), fields(id = %item.id, content_type = %item.content_type))]
    pub async fn store(&self, item: &MemoryItem) -> bool {
        match self.try_store(item).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to store item {}: {}", item.id, e);
                false
            }
        }
    }

    async fn try_store(&self, item: &MemoryItem) -> Result<()> {
        let metadata_json = serde_json::to_string(&item.metadata)?;
        let tags_json = serde_json::to_string(&item.tags)?;
        let item = item.clone();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(
                    r#"
                    INSERT INTO memory_items (
                        id, content_type, title, content, metadata, tags, created_at, updated_at,
                        access_count, last_accessed, size_bytes, hash, client_id, expires_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                    ON CONFLICT (id) DO UPDATE SET
                        content_type = excluded.content_type,
                        title = excluded.title,
                        content = excluded.content,
                        metadata = excluded.metadata,
                        tags = excluded.tags,
                        created_at = excluded.created_at,
                        updated_at = excluded.updated_at,
                        access_count = excluded.access_count,
                        last_accessed = excluded.last_accessed,
                        size_bytes = excluded.size_bytes,
                        hash = excluded.hash,
                        client_id = excluded.client_id,
                        expires_at = excluded.expires_at
                    "#,
                )?;

                stmt.execute(params![
                    &item.id,
                    &item.content_type,
                    &item.title,
                    &item.content,
                    &metadata_json,
                    &tags_json,
                    format_timestamp(item.created_at),
                    format_timestamp(item.updated_at),
                    item.access_count as i64,
                    format_timestamp(item.last_accessed),
                    item.size_bytes as i64,
                    &item.hash,
                    &item.client_id,
                    item.expires_at.map(format_timestamp),
                ])?;
                tracing::trace!("Item stored successfully");
                Ok::<_, rusqlite::Error>(())
            })
            .await?;

        Ok(())
    }

    /// Read an item and record the access
    ///
    /// The returned item reflects the row before `access_count` and
    /// `last_accessed` were bumped. Read and bump share one transaction, so
    /// concurrent retrievals of the same id are all counted.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, id: &str) -> Option<MemoryItem> {
        match self.try_retrieve(id, Utc::now()).await {
            Ok(item) => {
                if item.is_none() {
                    tracing::debug!("Item not found: {}", id);
                }
                item
            }
            Err(e) => {
                tracing::error!("Failed to retrieve item {}: {}", id, e);
                None
            }
        }
    }

    async fn try_retrieve(&self, id: &str, now: DateTime<Utc>) -> Result<Option<MemoryItem>> {
        let id = id.to_owned();
        let accessed_at = format_timestamp(now);

        let item = self
            .conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let item = {
                    let mut stmt =
                        tx.prepare_cached(&format!("SELECT {ITEM_COLUMNS} FROM memory_items WHERE id = ?1"))?;
                    stmt.query_row(params![&id], item_from_row).optional()?
                };

                if item.is_some() {
                    tx.execute(
                        "UPDATE memory_items SET access_count = access_count + 1, last_accessed = ?1 WHERE id = ?2",
                        params![&accessed_at, &id],
                    )?;
                }
                tx.commit()?;
                Ok::<_, rusqlite::Error>(item)
            })
            .await?;

        Ok(item)
    }

    /// Filtered, ordered and capped listing of items
    #[instrument(skip(self, query), fields(query = %query.query, sort_by = %query.sort_by, limit = query.max_results))]
    pub async fn search(&self, query: &MemoryQuery) -> Vec<MemoryItem> {
        match self.try_search(query).await {
            Ok(items) => {
                tracing::debug!("Search returned {} items", items.len());
                items
            }
            Err(e) => {
                tracing::error!("Search failed: {}", e);
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &MemoryQuery) -> Result<Vec<MemoryItem>> {
        let (where_clause, mut values) = query.where_clause();
        values.push(Value::Integer(i64::try_from(query.max_results).unwrap_or(i64::MAX)));

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM memory_items {} ORDER BY {} LIMIT ?",
            where_clause,
            query.sort_by.order_clause()
        );
        tracing::trace!("Search SQL: {}", sql);

        let items = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&sql)?;
                let items = stmt
                    .query_map(params_from_iter(values), item_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok::<_, rusqlite::Error>(items)
            })
            .await?;

        Ok(items)
    }

    /// Delete an item; `true` only when a row was removed
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> bool {
        let owned_id = id.to_owned();
        let result = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached("DELETE FROM memory_items WHERE id = ?1")?;
                let rows_affected = stmt.execute(params![&owned_id])?;
                Ok::<_, rusqlite::Error>(rows_affected > 0)
            })
            .await;

        match result {
            Ok(deleted) => {
                tracing::debug!("Delete {}: removed={}", id, deleted);
                deleted
            }
            Err(e) => {
                tracing::error!("Failed to delete item {}: {}", id, e);
                false
            }
        }
    }

    /// Remove every item whose deadline has passed; returns the number removed
    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    /// Remove every item whose deadline lies strictly before `now`
    #[instrument(skip(self))]
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = format_timestamp(now);
        let result = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare_cached("DELETE FROM memory_items WHERE expires_at IS NOT NULL AND expires_at < ?1")?;
                let removed = stmt.execute(params![&cutoff])?;
                Ok::<_, rusqlite::Error>(removed)
            })
            .await;

        match result {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!("Swept {} expired items", removed);
                }
                removed
            }
            Err(e) => {
                tracing::error!("Expiration sweep failed: {}", e);
                0
            }
        }
    }

    /// Aggregate counts and sizes, optionally scoped to one client
    #[instrument(skip(self))]
    pub async fn stats(&self, client_id: Option<&str>) -> Result<StoreStats> {
        let client_id = client_id.map(str::to_owned);

        let stats = self
            .conn
            .call(move |conn| {
                let (total_items, total_size): (i64, i64) = conn.query_row(
                    "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM memory_items \
                     WHERE (?1 IS NULL OR client_id = ?1)",
                    params![&client_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                let mut stmt = conn.prepare_cached(
                    "SELECT content_type, COUNT(*) FROM memory_items \
                     WHERE (?1 IS NULL OR client_id = ?1) GROUP BY content_type",
                )?;
                let type_rows = stmt.query_map(params![&client_id], |row| {
                    let content_type: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    Ok((content_type, count as usize))
                })?;

                let mut type_counts = HashMap::new();
                for row in type_rows {
                    let (content_type, count) = row?;
                    type_counts.insert(content_type, count);
                }

                Ok::<_, rusqlite::Error>(StoreStats {
                    total_items: total_items as usize,
                    type_counts,
                    total_size_bytes: total_size as u64,
                })
            })
            .await?;

        Ok(stats)
    }

    /// Number of rows currently stored, expired-but-unswept included
    pub async fn count(&self) -> Result<usize> {
        let count = self
            .conn
            .call(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM memory_items", [], |row| row.get(0))?;
                Ok::<_, rusqlite::Error>(count as usize)
            })
            .await?;
        Ok(count)
    }
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        parse_timestamp(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Map a row selected with [`ITEM_COLUMNS`]
fn item_from_row(row: &Row<'_>) -> rusqlite::Result<MemoryItem> {
    let id: String = row.get(0)?;

    let metadata_raw: Option<String> = row.get(4)?;
    let metadata = decode_metadata(metadata_raw.as_deref());
    if metadata.is_fallback() {
        tracing::debug!("Unreadable metadata for item {}, using empty map", id);
    }

    let tags_raw: Option<String> = row.get(5)?;
    let tags = decode_tags(tags_raw.as_deref());
    if tags.is_fallback() {
        tracing::debug!("Unreadable tags for item {}, using empty list", id);
    }

    let access_count: i64 = row.get(8)?;
    let size_bytes: i64 = row.get(10)?;

    Ok(MemoryItem {
        id,
        content_type: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        metadata: metadata.into_inner(),
        tags: tags.into_inner(),
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
        access_count: access_count.max(0) as u64,
        last_accessed: timestamp_column(row, 9)?,
        size_bytes: size_bytes.max(0) as u64,
        hash: row.get(11)?,
        client_id: row.get(12)?,
        expires_at: optional_timestamp_column(row, 13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortBy;
    use crate::schema::SCHEMA_VERSION;
    use chrono::Duration;
    use tempfile::TempDir;

    async fn open_temp() -> (TempDir, MemoryDatabase) {
        let temp_dir = TempDir::new().unwrap();
        let db = MemoryDatabase::open(&temp_dir.path().join("memory.db")).await.unwrap();
        (temp_dir, db)
    }

    fn item(content_type: &str, title: &str, content: &str) -> MemoryItem {
        MemoryItem::new(content_type, title, content, Utc::now())
    }

    #[tokio::test]
    async fn test_open_creates_data_dir_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("data").join("memory.db");
        let db = MemoryDatabase::open(&db_path).await.unwrap();
        assert!(db_path.exists());
        assert_eq!(db.path(), db_path.as_path());

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        let version = MigrationManager::get_current_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("memory.db");

        let db = MemoryDatabase::open(&db_path).await.unwrap();
        assert!(db.store(&item("plan", "Keep me", "body")).await);
        drop(db);

        let reopened = MemoryDatabase::open(&db_path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_open_fails_when_parent_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let result = MemoryDatabase::open(&blocker.join("memory.db")).await;
        assert!(matches!(result, Err(Error::DataDir { .. })));
    }

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let (_temp_dir, db) = open_temp().await;

        let mut stored = item("presentation", "Quarterly Deck", "# Slides\n\nRevenue up.");
        stored.tags = vec!["q3".to_string(), "finance".to_string()];
        stored.client_id = Some("c1".to_string());
        stored.metadata.insert("slides".to_string(), serde_json::json!(12));
        stored.expires_at = Some(Utc::now() + Duration::days(7));
        assert!(db.store(&stored).await);

        let retrieved = db.retrieve(&stored.id).await.unwrap();
        assert_eq!(retrieved.content, stored.content);
        assert_eq!(retrieved.tags, stored.tags);
        assert_eq!(retrieved.metadata, stored.metadata);
        assert_eq!(retrieved.client_id, stored.client_id);
        assert_eq!(retrieved.hash, stored.hash);
        assert_eq!(retrieved.size_bytes, stored.size_bytes);
        assert_eq!(
            retrieved.expires_at.map(format_timestamp),
            stored.expires_at.map(format_timestamp)
        );
    }

    #[tokio::test]
    async fn test_retrieve_not_found() {
        let (_temp_dir, db) = open_temp().await;
        assert!(db.retrieve("does-not-exist").await.is_none());
    }

    #[tokio::test]
    async fn test_retrieve_returns_pre_bump_row() {
        let (_temp_dir, db) = open_temp().await;
        let stored = item("plan", "Plan", "steps");
        assert!(db.store(&stored).await);

        let first = db.retrieve(&stored.id).await.unwrap();
        assert_eq!(first.access_count, 0);

        let second = db.retrieve(&stored.id).await.unwrap();
        assert_eq!(second.access_count, 1);
        assert!(second.last_accessed >= first.last_accessed);
    }

    #[tokio::test]
    async fn test_concurrent_retrieves_are_all_counted() {
        let (_temp_dir, db) = open_temp().await;
        let stored = item("plan", "Plan", "steps");
        assert!(db.store(&stored).await);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            let id = stored.id.clone();
            handles.push(tokio::spawn(async move { db.retrieve(&id).await.is_some() }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        let item = db.retrieve(&stored.id).await.unwrap();
        assert_eq!(item.access_count, 8);
    }

    #[tokio::test]
    async fn test_store_upserts_on_id() {
        let (_temp_dir, db) = open_temp().await;
        let mut stored = item("plan", "Draft", "v1");
        assert!(db.store(&stored).await);

        stored.title = "Final".to_string();
        stored.tags = vec!["done".to_string()];
        assert!(db.store(&stored).await);

        assert_eq!(db.count().await.unwrap(), 1);
        let retrieved = db.retrieve(&stored.id).await.unwrap();
        assert_eq!(retrieved.title, "Final");
        assert_eq!(retrieved.tags, vec!["done".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_columns_degrade_to_empty() {
        let (temp_dir, db) = open_temp().await;
        let mut stored = item("analysis", "Broken", "body");
        stored.tags = vec!["x".to_string()];
        stored.metadata.insert("k".to_string(), serde_json::json!("v"));
        assert!(db.store(&stored).await);

        let raw = rusqlite::Connection::open(temp_dir.path().join("memory.db")).unwrap();
        raw.execute(
            "UPDATE memory_items SET metadata = '{oops', tags = 'not-json' WHERE id = ?1",
            [&stored.id],
        )
        .unwrap();
        drop(raw);

        let retrieved = db.retrieve(&stored.id).await.unwrap();
        assert!(retrieved.metadata.is_empty());
        assert!(retrieved.tags.is_empty());
        assert_eq!(retrieved.content, "body");
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, db) = open_temp().await;
        let stored = item("plan", "Delete me", "body");
        assert!(db.store(&stored).await);

        assert!(db.delete(&stored.id).await);
        assert!(db.retrieve(&stored.id).await.is_none());
        assert!(!db.delete(&stored.id).await);
    }

    #[tokio::test]
    async fn test_search_filters() {
        let (_temp_dir, db) = open_temp().await;

        let mut deck = item("presentation", "Sales Deck", "pipeline numbers");
        deck.tags = vec!["sales".to_string()];
        deck.client_id = Some("c1".to_string());
        let mut plan = item("plan", "Launch Plan", "timeline for launch");
        plan.tags = vec!["launch".to_string(), "q3".to_string()];
        plan.client_id = Some("c2".to_string());
        let research = item("research", "Market Notes", "competitor pipeline");
        for it in [&deck, &plan, &research] {
            assert!(db.store(it).await);
        }

        let all = db.search(&MemoryQuery::default()).await;
        assert_eq!(all.len(), 3);

        let text = db.search(&MemoryQuery::new("pipeline")).await;
        assert_eq!(text.len(), 2);

        let typed = db.search(&MemoryQuery::default().with_content_type("plan")).await;
        assert_eq!(typed.len(), 1);
        assert_eq!(typed[0].id, plan.id);

        let scoped = db.search(&MemoryQuery::new("pipeline").with_client_id("c1")).await;
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, deck.id);

        let tagged = db
            .search(&MemoryQuery::default().with_tags(vec!["sales".to_string(), "q3".to_string()]))
            .await;
        assert_eq!(tagged.len(), 2);

        let tag_text = db.search(&MemoryQuery::new("launch")).await;
        assert_eq!(tag_text.len(), 1);
    }

    #[tokio::test]
    async fn test_search_date_range() {
        let (_temp_dir, db) = open_temp().await;
        let now = Utc::now();

        let old = MemoryItem::new("plan", "Old", "old body", now - Duration::days(30));
        let recent = MemoryItem::new("plan", "Recent", "recent body", now - Duration::days(1));
        assert!(db.store(&old).await);
        assert!(db.store(&recent).await);

        let hits = db
            .search(&MemoryQuery::default().with_date_range(Some(now - Duration::days(7)), None))
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, recent.id);

        let hits = db
            .search(&MemoryQuery::default().with_date_range(None, Some(now - Duration::days(7))))
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, old.id);

        let far_future = now + Duration::days(3_000_000);
        let hits = db
            .search(&MemoryQuery::default().with_date_range(None, Some(far_future)))
            .await;
        assert_eq!(hits.len(), 2);
        let hits = db
            .search(&MemoryQuery::default().with_date_range(Some(far_future), None))
            .await;
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_search_ordering_and_limit() {
        let (_temp_dir, db) = open_temp().await;
        let now = Utc::now();

        let oldest = MemoryItem::new("plan", "A", "a", now - Duration::days(3));
        let mut popular = MemoryItem::new("plan", "B", "b", now - Duration::days(2));
        popular.access_count = 5;
        let newest = MemoryItem::new("plan", "C", "c", now - Duration::days(1));
        for it in [&oldest, &popular, &newest] {
            assert!(db.store(it).await);
        }

        let by_date = db.search(&MemoryQuery::default().with_sort_by(SortBy::Date)).await;
        let ids: Vec<_> = by_date.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![newest.id.as_str(), popular.id.as_str(), oldest.id.as_str()]);

        let by_relevance = db.search(&MemoryQuery::default()).await;
        let ids: Vec<_> = by_relevance.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec![popular.id.as_str(), newest.id.as_str(), oldest.id.as_str()]);

        let by_access = db.search(&MemoryQuery::default().with_sort_by(SortBy::AccessCount)).await;
        assert_eq!(by_access[0].id, popular.id);

        let capped = db.search(&MemoryQuery::default().with_max_results(2)).await;
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_search_does_not_bump_access_count() {
        let (_temp_dir, db) = open_temp().await;
        let stored = item("plan", "Quiet", "body");
        assert!(db.store(&stored).await);

        db.search(&MemoryQuery::new("body")).await;
        let retrieved = db.retrieve(&stored.id).await.unwrap();
        assert_eq!(retrieved.access_count, 0);
    }

    #[tokio::test]
    async fn test_sweep_expired_at() {
        let (_temp_dir, db) = open_temp().await;
        let now = Utc::now();

        let mut expired = item("plan", "Expired", "gone");
        expired.expires_at = Some(now - Duration::hours(1));
        let mut live = item("plan", "Live", "here");
        live.expires_at = Some(now + Duration::hours(1));
        let forever = item("plan", "Forever", "always");
        for it in [&expired, &live, &forever] {
            assert!(db.store(it).await);
        }

        assert_eq!(db.sweep_expired_at(now).await, 1);
        assert!(db.retrieve(&expired.id).await.is_none());
        assert!(db.retrieve(&live.id).await.is_some());
        assert!(db.retrieve(&forever.id).await.is_some());

        assert_eq!(db.sweep_expired_at(now).await, 0);
        assert_eq!(db.sweep_expired_at(now + Duration::days(1)).await, 1);
    }

    #[tokio::test]
    async fn test_stats() {
        let (_temp_dir, db) = open_temp().await;

        let mut a = item("presentation", "A", "12345");
        a.client_id = Some("c1".to_string());
        let mut b = item("presentation", "B", "123");
        b.client_id = Some("c2".to_string());
        let c = item("plan", "C", "1234567890");
        for it in [&a, &b, &c] {
            assert!(db.store(it).await);
        }

        let all = db.stats(None).await.unwrap();
        assert_eq!(all.total_items, 3);
        assert_eq!(all.total_size_bytes, 18);
        assert_eq!(all.type_counts.get("presentation"), Some(&2));
        assert_eq!(all.type_counts.get("plan"), Some(&1));

        let scoped = db.stats(Some("c1")).await.unwrap();
        assert_eq!(scoped.total_items, 1);
        assert_eq!(scoped.total_size_bytes, 5);
        assert_eq!(scoped.type_counts, HashMap::from([("presentation".to_string(), 1)]));

        let empty = db.stats(Some("nobody")).await.unwrap();
        assert_eq!(empty, StoreStats::default());
    }
}
