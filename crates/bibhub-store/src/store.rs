use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bibhub_cas::{ContentStore, FsContentStore};
use bibhub_compose::{ChangeLogComposer, ComposeReport, HookComposer, HookContext, HookOrchestrator};
use bibhub_identity::{
    DefaultNormalizer, IdentifierNormalizer, IdentityError, IdentityIndex, IdentityRecord,
    IdentityResult, IdentitySource,
};
use bibhub_search::{InMemorySearchIndex, SearchIndex};
use bibhub_spoke::handler::entry_from_hub;
use bibhub_spoke::{
    read_json, remove_if_exists, write_json, ChangeLogHook, ContentStoreIngestor,
    HandlerRegistry, NotesHook, PrimaryHook, SpokeHandler,
};
use bibhub_types::{
    CasResult, ChangeLogEvent, Entry, EntryHub, EntryId, HookKind, SearchFilter, Workspace,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, TryStreamExt};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::extract::{ContentExtractor, FileTextExtractor};
use crate::locks::EntryLocks;

// ---------------------------------------------------------------------------
// EntryStore
// ---------------------------------------------------------------------------

/// The entry store: persists entries as a hub file plus hook files under a
/// workspace directory and keeps the search and identity indexes in step.
///
/// Hub and hook files are the source of truth. Both indexes are derived and
/// can be rebuilt with [`EntryStore::reindex`]. A save touches several
/// files without a transaction; re-running the same save converges.
pub struct EntryStore {
    workspace: Workspace,
    config: StoreConfig,
    cas: Arc<dyn ContentStore>,
    handlers: HandlerRegistry,
    composers: HookOrchestrator,
    search: Arc<dyn SearchIndex>,
    identity: IdentityIndex,
    extractor: Option<Arc<dyn ContentExtractor>>,
    locks: EntryLocks,
}

/// Counts from [`EntryStore::reindex`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReindexReport {
    pub indexed: usize,
    pub skipped: usize,
}

/// Builder for [`EntryStore`] with injectable collaborators.
pub struct EntryStoreBuilder {
    root: PathBuf,
    config: StoreConfig,
    cas: Option<Arc<dyn ContentStore>>,
    handlers: Option<HandlerRegistry>,
    search: Option<Arc<dyn SearchIndex>>,
    normalizer: Option<Arc<dyn IdentifierNormalizer>>,
    extractor: Option<Option<Arc<dyn ContentExtractor>>>,
}

impl EntryStoreBuilder {
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn content_store(mut self, cas: Arc<dyn ContentStore>) -> Self {
        self.cas = Some(cas);
        self
    }

    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = Some(handlers);
        self
    }

    pub fn search_index(mut self, search: Arc<dyn SearchIndex>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn normalizer(mut self, normalizer: Arc<dyn IdentifierNormalizer>) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Replace the text extractor; `None` disables extraction.
    pub fn extractor(mut self, extractor: Option<Arc<dyn ContentExtractor>>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn build(self) -> EntryStore {
        let workspace =
            Workspace::with_layout(&self.root, &self.config.entries_dir, &self.config.cas_dir);
        let cas = self.cas.unwrap_or_else(|| {
            Arc::new(FsContentStore::new(
                workspace.cas_root(),
                self.config.ingest_mode,
            )) as Arc<dyn ContentStore>
        });
        let extractor = self.extractor.unwrap_or_else(|| {
            self.config.extract_text.then(|| {
                Arc::new(FileTextExtractor::new(self.config.max_extract_bytes))
                    as Arc<dyn ContentExtractor>
            })
        });
        EntryStore {
            composers: HookOrchestrator::with_default_composers(workspace.clone()),
            workspace,
            cas,
            handlers: self
                .handlers
                .unwrap_or_else(HandlerRegistry::with_default_handlers),
            search: self
                .search
                .unwrap_or_else(|| Arc::new(InMemorySearchIndex::new()) as Arc<dyn SearchIndex>),
            identity: IdentityIndex::new(
                self.normalizer
                    .unwrap_or_else(|| Arc::new(DefaultNormalizer) as Arc<dyn IdentifierNormalizer>),
            ),
            extractor,
            locks: EntryLocks::new(),
            config: self.config,
        }
    }
}

impl EntryStore {
    /// Start configuring a store rooted at `root` with default settings.
    pub fn builder(root: impl Into<PathBuf>) -> EntryStoreBuilder {
        EntryStoreBuilder {
            root: root.into(),
            config: StoreConfig::default(),
            cas: None,
            handlers: None,
            search: None,
            normalizer: None,
            extractor: None,
        }
    }

    /// Open a workspace, reading `bibhub.toml` if present.
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let config = StoreConfig::load_from_workspace(&root).await?;
        Ok(Self::builder(root).config(config).build())
    }

    /// Create the workspace directories and a default `bibhub.toml` (kept
    /// if one already exists), then open it.
    pub async fn init(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        let config_path = StoreConfig::path_in(&root);
        let config = StoreConfig::load(&config_path).await?;
        let workspace = Workspace::with_layout(&root, &config.entries_dir, &config.cas_dir);
        tokio::fs::create_dir_all(workspace.entries_dir()).await?;
        tokio::fs::create_dir_all(workspace.cas_root()).await?;
        if !bibhub_spoke::file_exists(&config_path).await {
            config.write(&config_path).await?;
        }
        info!(root = %root.display(), "initialized workspace");
        Ok(Self::builder(root).config(config).build())
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn identity(&self) -> &IdentityIndex {
        &self.identity
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Absolute path of a content-store relative path.
    pub fn resolve_file(&self, relative: &str) -> PathBuf {
        self.cas.resolve(relative)
    }

    // ---- Write path ----

    /// Persist `entry`: content store, hub, notes, primary hook, change log,
    /// search index, identity index.
    ///
    /// Assigns an id if the entry has none and rewrites file references to
    /// content-store paths. Returns the entry's id.
    pub async fn save(&self, entry: &mut Entry) -> StoreResult<EntryId> {
        let id = *entry.id.get_or_insert_with(EntryId::new);
        let guard = self.locks.acquire(id).await;
        let result = self.save_locked(id, entry).await;
        drop(guard);
        self.locks.prune();
        result
    }

    async fn save_locked(&self, id: EntryId, entry: &mut Entry) -> StoreResult<EntryId> {
        let now = Utc::now();
        if !entry.has_notes() {
            entry.notes = None;
        }

        let primary = self.ingest_primary(entry).await?;
        entry.main_file_path = primary.relative_path.clone();
        entry.main_file_hash = primary.hash.clone();
        entry.original_file_name = primary.original_file_name.clone();

        let handler = self.handlers.for_type(entry.entry_type)?;
        let mut hub = self.write_hub(id, entry, handler.hook_kind(), now).await?;

        let notes_path = self.workspace.hook_path(&id, HookKind::Notes);
        match entry.notes.as_deref() {
            Some(text) => {
                let notes = NotesHook {
                    text: text.to_string(),
                    updated_utc: now,
                };
                write_json(&notes_path, &notes).await?;
            }
            None => {
                remove_if_exists(&notes_path).await?;
            }
        }

        let ingestor = ContentStoreIngestor::new(self.cas.as_ref());
        let hook = handler.build_hook(entry, &primary, &ingestor).await?;
        handler.persist_hook(&self.workspace, &id, &hook).await?;
        entry.attachments = hook.attachments().to_vec();

        if !entry.pending_events.is_empty() {
            let context = HookContext::new()
                .with_events(entry.pending_events.iter().cloned())
                .with_actor(self.config.actor.clone());
            match ChangeLogComposer
                .persist(&self.workspace, &id, &context)
                .await
            {
                Ok(()) => {
                    entry.pending_events.clear();
                    if !hub.has_hook(HookKind::ChangeLog) {
                        hub.set_hook(HookKind::ChangeLog);
                        write_json(&self.workspace.hub_path(&id), &hub).await?;
                    }
                }
                Err(e) => warn!(%id, error = %e, "change log not flushed; events stay queued"),
            }
        }

        let text = self.extract(&primary).await;
        let record = handler.index_contribution(&hub, &hook, text.as_deref())?;
        self.search.upsert(record).await?;
        self.identity
            .record(id, entry.doi.as_deref(), entry.pmid.as_deref());

        entry.created_utc = Some(hub.created_utc);
        entry.updated_utc = Some(hub.updated_utc);
        entry.created_by = Some(hub.created_by.clone());
        entry.updated_by = Some(hub.updated_by.clone());
        entry.creation_method = hub.creation_method;

        debug!(%id, entry_type = %entry.entry_type, handler = handler.name(), "saved entry");
        Ok(id)
    }

    async fn ingest_primary(&self, entry: &Entry) -> StoreResult<CasResult> {
        let Some(path) = entry.main_file_path.as_deref() else {
            return Ok(CasResult::empty());
        };
        if Path::new(path).is_absolute() {
            return Ok(self.cas.ingest(Some(Path::new(path))).await?);
        }
        if let Some(stored) = self
            .cas
            .describe(path, entry.original_file_name.clone())
            .await?
        {
            return Ok(stored);
        }
        warn!(path, "stored file is missing; keeping recorded reference");
        Ok(CasResult {
            relative_path: Some(path.to_string()),
            hash: entry.main_file_hash.clone(),
            size: 0,
            original_file_name: entry.original_file_name.clone(),
        })
    }

    /// Build and write the hub, merging with any previous version.
    async fn write_hub(
        &self,
        id: EntryId,
        entry: &Entry,
        primary: HookKind,
        now: DateTime<Utc>,
    ) -> StoreResult<EntryHub> {
        let previous: Option<EntryHub> = read_json(&self.workspace.hub_path(&id)).await?;
        let mut hub = EntryHub::new(id, entry, &self.config.actor, now);

        if let Some(previous) = previous {
            hub.created_utc = previous.created_utc;
            hub.created_by = previous.created_by;
            hub.creation_method = previous.creation_method;
            for kind in previous.hooks.keys().copied() {
                if kind != HookKind::Notes
                    && bibhub_spoke::file_exists(&self.workspace.hook_path(&id, kind)).await
                {
                    hub.set_hook(kind);
                }
            }
        }

        hub.set_primary(primary);
        if entry.has_notes() {
            hub.set_hook(HookKind::Notes);
        }

        write_json(&self.workspace.hub_path(&id), &hub).await?;
        Ok(hub)
    }

    async fn extract(&self, primary: &CasResult) -> Option<String> {
        let extractor = self.extractor.as_ref()?;
        let path = self.cas.resolve(primary.relative_path.as_deref()?);
        match extractor
            .extract_text(&path, primary.original_file_name.as_deref())
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "text extraction failed");
                None
            }
        }
    }

    // ---- Read path ----

    /// Read the raw hub for `id`.
    pub async fn hub(&self, id: &EntryId) -> StoreResult<Option<EntryHub>> {
        Ok(read_json(&self.workspace.hub_path(id)).await?)
    }

    /// Load and reconstruct the entry for `id`. `Ok(None)` if there is no
    /// hub; malformed hub or hook files are errors.
    pub async fn get_by_id(&self, id: &EntryId) -> StoreResult<Option<Entry>> {
        let Some(hub) = self.hub(id).await? else {
            return Ok(None);
        };
        let (handler, hook) = self.load_primary(&hub).await?;
        self.materialize(&hub, handler.as_ref(), hook.as_ref())
            .await
            .map(Some)
    }

    async fn load_primary(
        &self,
        hub: &EntryHub,
    ) -> StoreResult<(Arc<dyn SpokeHandler>, Option<PrimaryHook>)> {
        let handler = self.handlers.for_hub(hub)?;
        let hook = handler.load_hook(&self.workspace, &hub.id).await?;
        if hook.is_none() {
            debug!(id = %hub.id, handler = handler.name(), "primary hook missing");
        }
        Ok((handler, hook))
    }

    async fn materialize(
        &self,
        hub: &EntryHub,
        handler: &dyn SpokeHandler,
        hook: Option<&PrimaryHook>,
    ) -> StoreResult<Entry> {
        let mut entry = match hook {
            Some(hook) => handler.map_to_entry(hub, hook)?,
            None => entry_from_hub(hub),
        };
        if hub.has_hook(HookKind::Notes) {
            let notes: Option<NotesHook> =
                read_json(&self.workspace.hook_path(&hub.id, HookKind::Notes)).await?;
            entry.notes = notes.map(|n| n.text);
        }
        Ok(entry)
    }

    /// Persisted change-log events for `id`, oldest first.
    pub async fn change_log(&self, id: &EntryId) -> StoreResult<Vec<ChangeLogEvent>> {
        let log: Option<ChangeLogHook> =
            read_json(&self.workspace.hook_path(id, HookKind::ChangeLog)).await?;
        Ok(log.map(|l| l.events).unwrap_or_default())
    }

    /// Entries matching `filter`, re-read from disk.
    ///
    /// The index only supplies ids. Ids whose hub has disappeared are
    /// skipped. Dropping the stream stops the walk between entries.
    pub fn search_stream<'a>(
        &'a self,
        filter: &'a SearchFilter,
    ) -> impl Stream<Item = StoreResult<Entry>> + Send + 'a {
        stream::once(async move { self.search.search(filter).await.map_err(StoreError::from) })
            .map_ok(|ids| stream::iter(ids.into_iter().map(Ok::<_, StoreError>)))
            .try_flatten()
            .try_filter_map(move |id| async move { self.get_by_id(&id).await })
    }

    /// Collecting form of [`Self::search_stream`].
    pub async fn search(&self, filter: &SearchFilter) -> StoreResult<Vec<Entry>> {
        self.search_stream(filter).try_collect().await
    }

    /// Lazily walk every entry directory.
    ///
    /// Each call starts a fresh walk. Directory names that are not entry
    /// ids and directories without a hub are skipped. Dropping the stream
    /// stops the walk.
    pub fn enumerate(&self) -> impl Stream<Item = StoreResult<Entry>> + Send + '_ {
        self.entry_ids()
            .try_filter_map(move |id| async move { self.get_by_id(&id).await })
    }

    /// Lazily list the ids of all entry directories.
    pub fn entry_ids(&self) -> impl Stream<Item = StoreResult<EntryId>> + Send + '_ {
        enum Walk {
            Start,
            Reading(tokio::fs::ReadDir),
            Done,
        }

        let entries_dir = self.workspace.entries_dir();
        stream::unfold(Walk::Start, move |state| {
            let entries_dir = entries_dir.clone();
            async move {
                let mut dir = match state {
                    Walk::Start => match tokio::fs::read_dir(&entries_dir).await {
                        Ok(dir) => dir,
                        Err(e) if e.kind() == ErrorKind::NotFound => return None,
                        Err(e) => return Some((Err(e.into()), Walk::Done)),
                    },
                    Walk::Reading(dir) => dir,
                    Walk::Done => return None,
                };
                loop {
                    match dir.next_entry().await {
                        Ok(Some(item)) => {
                            let name = item.file_name();
                            match name.to_str().and_then(|n| n.parse::<EntryId>().ok()) {
                                Some(id) => return Some((Ok(id), Walk::Reading(dir))),
                                None => continue,
                            }
                        }
                        Ok(None) => return None,
                        Err(e) => return Some((Err(e.into()), Walk::Done)),
                    }
                }
            }
        })
    }

    /// The first live entry whose main file or attachments hash to
    /// `sha256`.
    pub async fn find_by_hash(&self, sha256: &str) -> StoreResult<Option<Entry>> {
        let wanted = sha256.trim();
        for id in self.search.find_by_hash(wanted).await? {
            let Some(entry) = self.get_by_id(&id).await? else {
                continue;
            };
            let holds = entry
                .main_file_hash
                .iter()
                .chain(entry.attachments.iter().filter_map(|a| a.hash.as_ref()))
                .any(|h| h.eq_ignore_ascii_case(wanted));
            if holds {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Look up an entry by DOI, then PMID.
    ///
    /// The first call scans every entry to build the identity index.
    pub async fn find_by_identifiers(
        &self,
        doi: Option<&str>,
        pmid: Option<&str>,
    ) -> StoreResult<Option<Entry>> {
        for id in self.identity.candidates(self, doi, pmid).await? {
            if let Some(entry) = self.get_by_id(&id).await? {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    // ---- Maintenance ----

    /// Rebuild the search index and identity index from hub and hook files.
    ///
    /// Entries that fail to load are logged and counted as skipped.
    pub async fn reindex(&self) -> StoreResult<ReindexReport> {
        self.search.clear().await?;
        self.identity.reset().await;

        let ids: Vec<EntryId> = self.entry_ids().try_collect().await?;
        let mut report = ReindexReport::default();
        for id in ids {
            match self.index_entry(&id).await {
                Ok(true) => report.indexed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(%id, error = %e, "skipping entry during reindex");
                    report.skipped += 1;
                }
            }
        }
        self.identity.ensure_built(self).await?;
        info!(indexed = report.indexed, skipped = report.skipped, "reindex complete");
        Ok(report)
    }

    /// Re-project one entry into the search index. `Ok(false)` if it has
    /// no hub.
    async fn index_entry(&self, id: &EntryId) -> StoreResult<bool> {
        let Some(hub) = self.hub(id).await? else {
            return Ok(false);
        };
        let (handler, hook) = self.load_primary(&hub).await?;
        let Some(hook) = hook else {
            return Ok(false);
        };
        let text = match hook.main_file() {
            Some(file) => {
                self.extract(&CasResult {
                    relative_path: Some(file.path.clone()),
                    hash: Some(file.hash.clone()),
                    size: file.size,
                    original_file_name: file.original_file_name.clone(),
                })
                .await
            }
            None => None,
        };
        let record = handler.index_contribution(&hub, &hook, text.as_deref())?;
        self.search.upsert(record).await?;
        Ok(true)
    }

    /// Run the hook composers for an existing entry and declare every hook
    /// they wrote on its hub.
    pub async fn process_hooks(
        &self,
        id: &EntryId,
        context: &HookContext,
    ) -> StoreResult<ComposeReport> {
        let guard = self.locks.acquire(*id).await;
        let result = self.process_hooks_locked(id, context).await;
        drop(guard);
        self.locks.prune();
        result
    }

    async fn process_hooks_locked(
        &self,
        id: &EntryId,
        context: &HookContext,
    ) -> StoreResult<ComposeReport> {
        let Some(mut hub) = self.hub(id).await? else {
            return Err(StoreError::EntryNotFound(*id));
        };

        let report = self.composers.process(id, context).await;
        let persisted = report.persisted();
        if !persisted.is_empty() {
            for kind in &persisted {
                hub.set_hook(*kind);
            }
            hub.updated_utc = Utc::now();
            hub.updated_by = context
                .actor
                .clone()
                .unwrap_or_else(|| self.config.actor.clone());
            write_json(&self.workspace.hub_path(id), &hub).await?;
            self.index_entry(id).await?;
            if let Some(entry) = self.get_by_id(id).await? {
                self.identity
                    .record(*id, entry.doi.as_deref(), entry.pmid.as_deref());
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl IdentitySource for EntryStore {
    async fn scan_identities(&self) -> IdentityResult<Vec<IdentityRecord>> {
        let ids: Vec<EntryId> = self
            .entry_ids()
            .try_collect()
            .await
            .map_err(|e| IdentityError::Scan(e.to_string()))?;

        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get_by_id(&id).await {
                Ok(Some(entry)) => {
                    if entry.doi.is_none() && entry.pmid.is_none() {
                        continue;
                    }
                    records.push(IdentityRecord {
                        id,
                        doi: entry.doi,
                        pmid: entry.pmid,
                        updated_utc: entry.updated_utc.unwrap_or_default(),
                    });
                }
                Ok(None) => {}
                Err(e) => warn!(%id, error = %e, "skipping unreadable entry in identity scan"),
            }
        }
        debug!(records = records.len(), "identity scan finished");
        Ok(records)
    }
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("workspace", &self.workspace)
            .field("handlers", &self.handlers)
            .field("identity", &self.identity)
            .finish()
    }
}
