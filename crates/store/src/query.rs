//! Typed search requests and their SQL predicates

use crate::item::format_timestamp;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Result cap used when a query does not set one
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Ordering applied to search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Most accessed first, newest first among equals
    #[default]
    Relevance,
    /// Newest first
    Date,
    /// Most accessed first
    AccessCount,
}

impl SortBy {
    pub const VALUES: &[SortBy] = &[SortBy::Relevance, SortBy::Date, SortBy::AccessCount];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Date => "date",
            SortBy::AccessCount => "access_count",
        }
    }

    /// ORDER BY body for this sort; `id` breaks ties so repeated searches agree
    pub fn order_clause(&self) -> &'static str {
        match self {
            SortBy::Relevance => "access_count DESC, created_at DESC, id ASC",
            SortBy::Date => "created_at DESC, id ASC",
            SortBy::AccessCount => "access_count DESC, id ASC",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "date" => Ok(SortBy::Date),
            "access_count" => Ok(SortBy::AccessCount),
            _ => Err(format!("invalid sort order: {}", s)),
        }
    }
}

/// A read request over stored items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryQuery {
    /// Free text matched against title, content and tags
    pub query: String,
    pub content_type: Option<String>,
    /// Any-of tag filter
    pub tags: Option<Vec<String>>,
    /// Inclusive lower bound on `created_at`
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub date_to: Option<DateTime<Utc>>,
    pub max_results: usize,
    pub sort_by: SortBy,
    pub client_id: Option<String>,
}

impl Default for MemoryQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            content_type: None,
            tags: None,
            date_from: None,
            date_to: None,
            max_results: DEFAULT_MAX_RESULTS,
            sort_by: SortBy::default(),
            client_id: None,
        }
    }
}

impl MemoryQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), ..Default::default() }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_date_range(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Predicates for every field that is set, in a stable order
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        if let Some(content_type) = &self.content_type {
            predicates.push(Predicate::ContentType(content_type.clone()));
        }
        if let Some(client_id) = &self.client_id {
            predicates.push(Predicate::ClientId(client_id.clone()));
        }
        if let Some(from) = self.date_from {
            predicates.push(Predicate::CreatedFrom(from));
        }
        if let Some(to) = self.date_to {
            predicates.push(Predicate::CreatedTo(to));
        }
        if !self.query.is_empty() {
            predicates.push(Predicate::Text(self.query.clone()));
        }
        if let Some(tags) = &self.tags
            && !tags.is_empty()
        {
            predicates.push(Predicate::AnyTag(tags.clone()));
        }

        predicates
    }

    /// Render the WHERE clause (empty when no predicate applies) and its parameters
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        let mut fragments = Vec::new();
        let mut params = Vec::new();

        for predicate in self.predicates() {
            let (fragment, values) = predicate.to_sql();
            fragments.push(fragment);
            params.extend(values);
        }

        if fragments.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", fragments.join(" AND ")), params)
        }
    }
}

/// One parameterized search condition
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    ContentType(String),
    ClientId(String),
    CreatedFrom(DateTime<Utc>),
    CreatedTo(DateTime<Utc>),
    /// Substring match on title, content or serialized tags
    Text(String),
    /// Substring match of any tag against the serialized tags
    AnyTag(Vec<String>),
}

impl Predicate {
    /// SQL fragment with `?` placeholders and the values bound to them, in order
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        match self {
            Predicate::ContentType(content_type) => {
                ("content_type = ?".to_string(), vec![Value::Text(content_type.clone())])
            }
            Predicate::ClientId(client_id) => ("client_id = ?".to_string(), vec![Value::Text(client_id.clone())]),
            Predicate::CreatedFrom(from) => ("created_at >= ?".to_string(), vec![Value::Text(format_timestamp(*from))]),
            Predicate::CreatedTo(to) => ("created_at <= ?".to_string(), vec![Value::Text(format_timestamp(*to))]),
            Predicate::Text(text) => {
                let pattern = Value::Text(format!("%{}%", text));
                (
                    "(title LIKE ? OR content LIKE ? OR tags LIKE ?)".to_string(),
                    vec![pattern.clone(), pattern.clone(), pattern],
                )
            }
            Predicate::AnyTag(tags) => {
                let fragment = tags.iter().map(|_| "tags LIKE ?").collect::<Vec<_>>().join(" OR ");
                let values = tags.iter().map(|tag| Value::Text(format!("%{}%", tag))).collect();
                (format!("({})", fragment), values)
            }
        }
    }
}
