//! Stored artifact record and its derived fields

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Open metadata mapping attached to an item
pub type Metadata = HashMap<String, serde_json::Value>;

/// One stored artifact
///
/// `hash` and `size_bytes` are derived from `content` once, at creation.
/// Nothing updates an item in place: `updated_at` keeps its creation value
/// and storing a revised artifact means storing a new item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    /// UUID assigned at creation
    pub id: String,
    /// Free-form category tag, e.g. "presentation" or "plan"
    pub content_type: String,
    /// Short human label
    pub title: String,
    /// Full payload
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Free-form tags; order is kept for display
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of successful retrievals
    pub access_count: u64,
    pub last_accessed: DateTime<Utc>,
    /// UTF-8 byte length of `content`
    pub size_bytes: u64,
    /// SHA-256 hex digest of `content`
    pub hash: String,
    /// Owner scope; `None` is global
    pub client_id: Option<String>,
    /// Expiration deadline; `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl MemoryItem {
    /// Build a fresh item with derived id, hash and size, stamped at `now`
    pub fn new(
        content_type: impl Into<String>, title: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content_type: content_type.into(),
            title: title.into(),
            hash: fingerprint(&content),
            size_bytes: content_size(&content),
            content,
            metadata: Metadata::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            access_count: 0,
            last_accessed: now,
            client_id: None,
            expires_at: None,
        }
    }

    /// Check that `hash` and `size_bytes` still describe `content`
    pub fn verify_fingerprint(&self) -> bool {
        self.hash == fingerprint(&self.content) && self.size_bytes == content_size(&self.content)
    }

    /// Whether the item's deadline lies strictly before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline < now)
    }
}

/// SHA-256 of the content as lowercase hex (64 characters)
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Byte length of the content encoded as UTF-8
pub fn content_size(content: &str) -> u64 {
    content.len() as u64
}

/// Outcome of decoding a JSON text column
///
/// Malformed stored text never fails a read; it decodes to an empty value
/// tagged as a fallback so callers can tell the two apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Parsed(T),
    Fallback(T),
}

impl<T> Decoded<T> {
    pub fn into_inner(self) -> T {
        match self {
            Decoded::Parsed(value) | Decoded::Fallback(value) => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Decoded::Fallback(_))
    }
}

fn decode_column<T: DeserializeOwned + Default>(raw: Option<&str>) -> Decoded<T> {
    match raw {
        Some(text) => match serde_json::from_str(text) {
            Ok(value) => Decoded::Parsed(value),
            Err(_) => Decoded::Fallback(T::default()),
        },
        None => Decoded::Fallback(T::default()),
    }
}

/// Decode the stored `metadata` column
pub fn decode_metadata(raw: Option<&str>) -> Decoded<Metadata> {
    decode_column(raw)
}

/// Decode the stored `tags` column
pub fn decode_tags(raw: Option<&str>) -> Decoded<Vec<String>> {
    decode_column(raw)
}

/// 0000-01-01T00:00:00Z
const EARLIEST_STORED_MICROS: i64 = -62_167_219_200_000_000;
/// 9999-12-31T23:59:59.999999Z
const LATEST_STORED_MICROS: i64 = 253_402_300_799_999_999;

/// Whether `ts` lies after the last instant with a four-digit year
pub fn exceeds_storage_range(ts: DateTime<Utc>) -> bool {
    ts.timestamp_micros() > LATEST_STORED_MICROS
}

/// Render a timestamp for storage
///
/// Fixed-width RFC 3339 with microseconds and a `Z` suffix, so text
/// comparison in SQL matches chronological order. Instants outside years
/// 0000..=9999 are clamped to the nearest bound.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    let micros = ts.timestamp_micros().clamp(EARLIEST_STORED_MICROS, LATEST_STORED_MICROS);
    let ts = DateTime::from_timestamp_micros(micros).unwrap_or(ts);
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}
