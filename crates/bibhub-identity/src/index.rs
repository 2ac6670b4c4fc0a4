//! The lazily built DOI/PMID -> id index.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use bibhub_types::EntryId;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::IdentityResult;
use crate::normalize::{DefaultNormalizer, IdentifierNormalizer};
use crate::source::{IdentityRecord, IdentitySource};

/// Build state of an [`IdentityIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum IndexPhase {
    NotBuilt = 0,
    Building = 1,
    Ready = 2,
}

impl IndexPhase {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Building,
            2 => Self::Ready,
            _ => Self::NotBuilt,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Keys {
    doi: Option<String>,
    pmid: Option<String>,
}

/// Maps normalized DOIs and PMIDs to entry ids.
///
/// # Phases
///
/// The index starts `NotBuilt`. The first lookup takes the build lock,
/// moves to `Building`, scans the source once, and publishes `Ready`.
/// Concurrent first lookups wait on the lock and then see `Ready`; lookups
/// only read the maps once `Ready`, so a half-built index is never visible.
///
/// Updates that arrive while `Building` are queued and applied by the
/// builder before it publishes `Ready`. Updates while `NotBuilt` are
/// dropped: the record is already on disk and the scan will find it.
///
/// When two entries share a key the most recent write wins. The scan
/// applies records in `updated_utc` order to reproduce that.
pub struct IdentityIndex {
    normalizer: Arc<dyn IdentifierNormalizer>,
    phase: AtomicU8,
    build_lock: tokio::sync::Mutex<()>,
    pending: Mutex<Vec<(EntryId, Keys)>>,
    by_doi: DashMap<String, EntryId>,
    by_pmid: DashMap<String, EntryId>,
    keys: DashMap<EntryId, Keys>,
    scans: AtomicUsize,
}

impl IdentityIndex {
    pub fn new(normalizer: Arc<dyn IdentifierNormalizer>) -> Self {
        Self {
            normalizer,
            phase: AtomicU8::new(IndexPhase::NotBuilt as u8),
            build_lock: tokio::sync::Mutex::new(()),
            pending: Mutex::new(Vec::new()),
            by_doi: DashMap::new(),
            by_pmid: DashMap::new(),
            keys: DashMap::new(),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn phase(&self) -> IndexPhase {
        IndexPhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Number of full scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Acquire)
    }

    pub fn normalizer(&self) -> &dyn IdentifierNormalizer {
        self.normalizer.as_ref()
    }

    /// Number of entries with at least one indexed identifier.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Build from `source` unless already `Ready`.
    ///
    /// On scan failure the index returns to `NotBuilt` and the lock is
    /// released, so a later call retries.
    pub async fn ensure_built(&self, source: &dyn IdentitySource) -> IdentityResult<()> {
        if self.phase() == IndexPhase::Ready {
            return Ok(());
        }
        let _guard = self.build_lock.lock().await;
        if self.phase() == IndexPhase::Ready {
            return Ok(());
        }

        self.set_phase_locked(IndexPhase::Building);
        self.scans.fetch_add(1, Ordering::AcqRel);
        let mut records = match source.scan_identities().await {
            Ok(records) => records,
            Err(e) => {
                self.set_phase_locked(IndexPhase::NotBuilt);
                self.pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .clear();
                return Err(e);
            }
        };
        records.sort_by_key(|r| r.updated_utc);

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        for record in &records {
            let keys = self.normalize(record.doi.as_deref(), record.pmid.as_deref());
            self.apply(record.id, keys);
        }
        let queued = pending.len();
        for (id, keys) in pending.drain(..) {
            self.apply(id, keys);
        }
        self.phase.store(IndexPhase::Ready as u8, Ordering::Release);
        drop(pending);

        info!(
            scanned = records.len(),
            queued,
            indexed = self.keys.len(),
            "identity index built"
        );
        Ok(())
    }

    /// Record `id`'s current identifiers, replacing whatever it had before.
    pub fn record(&self, id: EntryId, doi: Option<&str>, pmid: Option<&str>) {
        let keys = self.normalize(doi, pmid);
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match self.phase() {
            IndexPhase::Ready => self.apply(id, keys),
            IndexPhase::Building => pending.push((id, keys)),
            IndexPhase::NotBuilt => {}
        }
    }

    /// Forget `id` entirely.
    pub fn forget(&self, id: &EntryId) {
        if let Some((_, old)) = self.keys.remove(id) {
            self.unlink(id, &old);
        }
    }

    /// Drop all mappings and return to `NotBuilt`. Waits for an in-flight
    /// build to finish first.
    pub async fn reset(&self) {
        let _guard = self.build_lock.lock().await;
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.clear();
        self.by_doi.clear();
        self.by_pmid.clear();
        self.keys.clear();
        self.phase.store(IndexPhase::NotBuilt as u8, Ordering::Release);
        debug!("identity index reset");
    }

    /// Build if needed, then look up a raw DOI.
    pub async fn lookup_doi(
        &self,
        source: &dyn IdentitySource,
        doi: &str,
    ) -> IdentityResult<Option<EntryId>> {
        self.ensure_built(source).await?;
        Ok(self
            .normalizer
            .normalize_doi(doi)
            .and_then(|k| self.by_doi.get(&k).map(|v| *v)))
    }

    /// Build if needed, then look up a raw PMID.
    pub async fn lookup_pmid(
        &self,
        source: &dyn IdentitySource,
        pmid: &str,
    ) -> IdentityResult<Option<EntryId>> {
        self.ensure_built(source).await?;
        Ok(self
            .normalizer
            .normalize_pmid(pmid)
            .and_then(|k| self.by_pmid.get(&k).map(|v| *v)))
    }

    /// Candidate ids for a DOI/PMID pair: the DOI match first, then the
    /// PMID match if it differs.
    pub async fn candidates(
        &self,
        source: &dyn IdentitySource,
        doi: Option<&str>,
        pmid: Option<&str>,
    ) -> IdentityResult<Vec<EntryId>> {
        let mut out = Vec::with_capacity(2);
        if let Some(doi) = doi {
            out.extend(self.lookup_doi(source, doi).await?);
        }
        if let Some(pmid) = pmid {
            if let Some(id) = self.lookup_pmid(source, pmid).await? {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        Ok(out)
    }

    fn set_phase_locked(&self, phase: IndexPhase) {
        let _pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        self.phase.store(phase as u8, Ordering::Release);
    }

    fn normalize(&self, doi: Option<&str>, pmid: Option<&str>) -> Keys {
        Keys {
            doi: doi.and_then(|d| self.normalizer.normalize_doi(d)),
            pmid: pmid.and_then(|p| self.normalizer.normalize_pmid(p)),
        }
    }

    fn apply(&self, id: EntryId, keys: Keys) {
        if let Some((_, old)) = self.keys.remove(&id) {
            self.unlink(&id, &old);
        }
        if keys.doi.is_none() && keys.pmid.is_none() {
            return;
        }
        if let Some(doi) = &keys.doi {
            self.by_doi.insert(doi.clone(), id);
        }
        if let Some(pmid) = &keys.pmid {
            self.by_pmid.insert(pmid.clone(), id);
        }
        self.keys.insert(id, keys);
    }

    fn unlink(&self, id: &EntryId, keys: &Keys) {
        if let Some(doi) = &keys.doi {
            self.by_doi.remove_if(doi, |_, v| v == id);
        }
        if let Some(pmid) = &keys.pmid {
            self.by_pmid.remove_if(pmid, |_, v| v == id);
        }
    }
}

impl Default for IdentityIndex {
    fn default() -> Self {
        Self::new(Arc::new(DefaultNormalizer))
    }
}

impl std::fmt::Debug for IdentityIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityIndex")
            .field("phase", &self.phase())
            .field("entries", &self.keys.len())
            .field("scans", &self.scan_count())
            .finish()
    }
}
