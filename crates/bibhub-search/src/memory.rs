//! In-memory search index for tests and small workspaces.
//!
//! [`InMemorySearchIndex`] keeps every record in a `HashMap` behind a
//! `RwLock` and evaluates filters with a linear scan.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bibhub_types::{EntryId, IndexRecord, SearchFilter};
use tracing::debug;

use crate::error::{SearchError, SearchResult};
use crate::filter::matches;
use crate::traits::SearchIndex;

/// An in-memory implementation of [`SearchIndex`]. Data is lost when the
/// index is dropped; rebuild it with the store's reindex.
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    records: RwLock<HashMap<EntryId, IndexRecord>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the record for `id`.
    pub fn get(&self, id: &EntryId) -> SearchResult<Option<IndexRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.get(id).cloned())
    }

    fn collect_sorted<'a>(
        records: impl Iterator<Item = &'a IndexRecord>,
        limit: Option<usize>,
    ) -> Vec<EntryId> {
        let mut hits: Vec<&IndexRecord> = records.collect();
        hits.sort_by(|a, b| {
            b.updated_utc
                .cmp(&a.updated_utc)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|r| r.id)
            .collect()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> SearchError {
    SearchError::LockPoisoned(e.to_string())
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn upsert(&self, record: IndexRecord) -> SearchResult<()> {
        let mut records = self.records.write().map_err(poisoned)?;
        debug!(id = %record.id, "search index upsert");
        records.insert(record.id, record);
        Ok(())
    }

    async fn remove(&self, id: &EntryId) -> SearchResult<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        Ok(records.remove(id).is_some())
    }

    async fn search(&self, filter: &SearchFilter) -> SearchResult<Vec<EntryId>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(Self::collect_sorted(
            records.values().filter(|r| matches(r, filter)),
            filter.limit,
        ))
    }

    async fn find_by_hash(&self, sha256: &str) -> SearchResult<Vec<EntryId>> {
        let wanted = sha256.trim();
        let records = self.records.read().map_err(poisoned)?;
        Ok(Self::collect_sorted(
            records
                .values()
                .filter(|r| r.asset_hashes.iter().any(|h| h.eq_ignore_ascii_case(wanted))),
            None,
        ))
    }

    async fn clear(&self) -> SearchResult<()> {
        self.records.write().map_err(poisoned)?.clear();
        Ok(())
    }

    async fn len(&self) -> SearchResult<usize> {
        Ok(self.records.read().map_err(poisoned)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bibhub_types::EntryType;
    use chrono::{Duration, Utc};

    fn record(title: &str, age_secs: i64, hashes: &[&str]) -> IndexRecord {
        IndexRecord {
            id: EntryId::new(),
            entry_type: EntryType::Report,
            title: title.into(),
            year: None,
            doi: None,
            pmid: None,
            journal: None,
            abstract_text: None,
            authors: Vec::new(),
            keywords: Vec::new(),
            tags: Default::default(),
            asset_hashes: hashes.iter().map(|h| h.to_string()).collect(),
            full_text: None,
            updated_utc: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[tokio::test]
    async fn upsert_replaces() {
        let index = InMemorySearchIndex::new();
        let mut r = record("First", 0, &[]);
        index.upsert(r.clone()).await.unwrap();
        r.title = "Second".into();
        index.upsert(r.clone()).await.unwrap();

        assert_eq!(index.len().await.unwrap(), 1);
        assert_eq!(index.get(&r.id).unwrap().unwrap().title, "Second");
        assert!(index.search(&SearchFilter::text("first")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn results_are_newest_first_and_limited() {
        let index = InMemorySearchIndex::new();
        let old = record("Report old", 100, &[]);
        let new = record("Report new", 1, &[]);
        index.upsert(old.clone()).await.unwrap();
        index.upsert(new.clone()).await.unwrap();

        let all = index.search(&SearchFilter::text("report")).await.unwrap();
        assert_eq!(all, vec![new.id, old.id]);
        let one = index
            .search(&SearchFilter::text("report").with_limit(1))
            .await
            .unwrap();
        assert_eq!(one, vec![new.id]);
    }

    #[tokio::test]
    async fn find_by_hash_ignores_case() {
        let index = InMemorySearchIndex::new();
        let a = record("a", 5, &["abc123", "def456"]);
        let b = record("b", 1, &["ABC123"]);
        index.upsert(a.clone()).await.unwrap();
        index.upsert(b.clone()).await.unwrap();
        index.upsert(record("c", 0, &["fff"])).await.unwrap();

        assert_eq!(index.find_by_hash("abc123").await.unwrap(), vec![b.id, a.id]);
        assert_eq!(index.find_by_hash("def456").await.unwrap(), vec![a.id]);
        assert!(index.find_by_hash("000").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let index = InMemorySearchIndex::new();
        let r = record("x", 0, &[]);
        index.upsert(r.clone()).await.unwrap();
        index.upsert(record("y", 0, &[])).await.unwrap();
        assert!(index.remove(&r.id).await.unwrap());
        assert!(!index.remove(&r.id).await.unwrap());
        index.clear().await.unwrap();
        assert!(index.is_empty().await.unwrap());
    }
}
