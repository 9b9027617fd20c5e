//! Public operations consumed by content generators, planners and other
//! collaborators.
//!
//! Every function takes the process's [`MemoryServer`] explicitly. Only
//! [`store_content`] can fail; the others report absence or failure as
//! `None`, an empty list, `false` or [`MemoryStats::error`].

use crate::error::Result;
use crate::item::MemoryItem;
use crate::server::{MemoryServer, MemoryStats, NewContent, SearchPreview};

/// Store an artifact and return its new id
pub async fn store_content(server: &MemoryServer, content: NewContent) -> Result<String> {
    server.store_content(content).await
}

/// Full record for `id`, or `None` when absent, deleted or swept
pub async fn retrieve_content(server: &MemoryServer, id: &str) -> Option<MemoryItem> {
    server.retrieve_content(id).await
}

/// Ranked previews matching `query` and the optional filters
pub async fn search_content(
    server: &MemoryServer, query: &str, content_type: Option<&str>, tags: Option<&[String]>,
    max_results: Option<usize>, client_id: Option<&str>,
) -> Vec<SearchPreview> {
    server
        .search_content(query, content_type, tags, max_results, client_id)
        .await
}

/// Delete `id`; `true` only if it existed
pub async fn delete_content(server: &MemoryServer, id: &str) -> bool {
    server.delete_content(id).await
}

/// Item count, per-type breakdown and total size, optionally per client
pub async fn get_memory_stats(server: &MemoryServer, client_id: Option<&str>) -> MemoryStats {
    server.get_memory_stats(client_id).await
}
