//! The [`SearchIndex`] trait: the narrow contract the entry store needs.
//!
//! The index is derived data. It answers "which ids match" and never
//! supplies field values; callers re-read matching entries from disk.

use async_trait::async_trait;
use bibhub_types::{EntryId, IndexRecord, SearchFilter};

use crate::error::SearchResult;

/// Query and upsert interface over index records.
///
/// Implementations must be `Send + Sync`. Upserting a record with an id
/// already present replaces the previous record.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert or replace the record for `record.id`.
    async fn upsert(&self, record: IndexRecord) -> SearchResult<()>;

    /// Remove the record for `id`. Returns `true` if it was present.
    async fn remove(&self, id: &EntryId) -> SearchResult<bool>;

    /// Ids matching `filter`, most recently updated first, truncated to
    /// `filter.limit` when set.
    async fn search(&self, filter: &SearchFilter) -> SearchResult<Vec<EntryId>>;

    /// Ids of records whose asset hashes include `sha256` (case-insensitive),
    /// most recently updated first.
    async fn find_by_hash(&self, sha256: &str) -> SearchResult<Vec<EntryId>>;

    /// Drop every record.
    async fn clear(&self) -> SearchResult<()>;

    /// Number of indexed records.
    async fn len(&self) -> SearchResult<usize>;

    async fn is_empty(&self) -> SearchResult<bool> {
        Ok(self.len().await? == 0)
    }
}
