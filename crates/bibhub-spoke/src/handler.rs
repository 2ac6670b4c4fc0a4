use std::path::Path;

use async_trait::async_trait;
use bibhub_cas::ContentStore;
use bibhub_types::{
    Attachment, CasResult, Entry, EntryHub, EntryId, EntryType, HookKind, IndexRecord, Workspace,
};
use tracing::debug;

use crate::error::{Result, SpokeError};
use crate::hooks::PrimaryHook;

/// Callback through which handlers ingest attachments that are not yet
/// content-addressed. Keeps the content store out of handler logic.
#[async_trait]
pub trait AttachmentIngestor: Send + Sync {
    async fn ingest_attachment(&self, source: &Path) -> Result<CasResult>;
}

/// [`AttachmentIngestor`] backed by a [`ContentStore`].
pub struct ContentStoreIngestor<'a> {
    store: &'a dyn ContentStore,
}

impl<'a> ContentStoreIngestor<'a> {
    pub fn new(store: &'a dyn ContentStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AttachmentIngestor for ContentStoreIngestor<'_> {
    async fn ingest_attachment(&self, source: &Path) -> Result<CasResult> {
        Ok(self.store.ingest(Some(source)).await?)
    }
}

/// Per-type strategy for building, reloading, and indexing an entry's
/// primary hook.
///
/// Handlers are stateless and `Send + Sync` so the registry can share them
/// behind `Arc<dyn SpokeHandler>`.
#[async_trait]
pub trait SpokeHandler: Send + Sync {
    /// Human-readable name (e.g. "article", "document").
    fn name(&self) -> &str;

    /// Entry types this handler owns.
    fn entry_types(&self) -> &[EntryType];

    /// The primary hook kind this handler reads and writes.
    fn hook_kind(&self) -> HookKind;

    /// Map an entry plus its primary-file ingestion result to a hook,
    /// ingesting any attachment that is not yet content-addressed.
    async fn build_hook(
        &self,
        entry: &Entry,
        primary: &CasResult,
        ingestor: &dyn AttachmentIngestor,
    ) -> Result<PrimaryHook>;

    /// Decode a raw hook file body into this handler's payload.
    fn decode_hook(&self, path: &Path, bytes: &[u8]) -> Result<PrimaryHook>;

    /// Rebuild an in-memory entry from its hub and primary hook.
    fn map_to_entry(&self, hub: &EntryHub, hook: &PrimaryHook) -> Result<Entry>;

    /// Project hub + hook + extracted text into a search-index record.
    fn index_contribution(
        &self,
        hub: &EntryHub,
        hook: &PrimaryHook,
        extracted_text: Option<&str>,
    ) -> Result<IndexRecord>;

    /// Read this handler's hook for `id`. `Ok(None)` if the file is absent.
    async fn load_hook(&self, workspace: &Workspace, id: &EntryId) -> Result<Option<PrimaryHook>> {
        let path = workspace.hook_path(id, self.hook_kind());
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        self.decode_hook(&path, &bytes).map(Some)
    }

    /// Write `hook` to this handler's hook file for `id`.
    async fn persist_hook(
        &self,
        workspace: &Workspace,
        id: &EntryId,
        hook: &PrimaryHook,
    ) -> Result<()> {
        self.expect_kind(hook)?;
        hook.write_to(&workspace.hook_path(id, self.hook_kind())).await?;
        debug!(%id, kind = %self.hook_kind(), "persisted primary hook");
        Ok(())
    }

    /// Reject hooks this handler does not own.
    fn expect_kind(&self, hook: &PrimaryHook) -> Result<()> {
        if hook.kind() == self.hook_kind() {
            Ok(())
        } else {
            Err(SpokeError::HookMismatch {
                expected: self.hook_kind(),
                found: hook.kind(),
            })
        }
    }
}

/// Ingest every attachment that still points at a source file.
pub async fn resolve_attachments(
    attachments: &[Attachment],
    ingestor: &dyn AttachmentIngestor,
) -> Result<Vec<Attachment>> {
    let mut resolved = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        if attachment.is_content_addressed() {
            resolved.push(attachment.clone());
            continue;
        }
        let cas = ingestor
            .ingest_attachment(Path::new(&attachment.path))
            .await?;
        let (Some(path), Some(hash)) = (cas.relative_path, cas.hash) else {
            continue;
        };
        resolved.push(Attachment {
            title: attachment.title.clone(),
            path,
            hash: Some(hash),
            original_file_name: cas.original_file_name,
            size: Some(cas.size),
        });
    }
    Ok(resolved)
}

/// The hub-owned part of an entry: identity, timestamps, tags.
pub fn entry_from_hub(hub: &EntryHub) -> Entry {
    Entry {
        id: Some(hub.id),
        entry_type: hub.entry_type,
        title: hub.display_title.clone(),
        tags: hub.tags.clone(),
        creation_method: hub.creation_method,
        created_utc: Some(hub.created_utc),
        updated_utc: Some(hub.updated_utc),
        created_by: Some(hub.created_by.clone()),
        updated_by: Some(hub.updated_by.clone()),
        ..Default::default()
    }
}

/// Copy the main-file reference of a hook onto an entry.
pub fn apply_main_file(entry: &mut Entry, hook: &PrimaryHook) {
    if let Some(file) = hook.main_file() {
        entry.main_file_path = Some(file.path.clone());
        entry.main_file_hash = Some(file.hash.clone());
        entry.original_file_name = file.original_file_name.clone();
    }
    entry.attachments = hook.attachments().to_vec();
}

/// The hub-owned part of an index record.
pub fn index_record_from_hub(hub: &EntryHub, hook: &PrimaryHook) -> IndexRecord {
    IndexRecord {
        id: hub.id,
        entry_type: hub.entry_type,
        title: hub.display_title.clone(),
        year: None,
        doi: None,
        pmid: None,
        journal: None,
        abstract_text: None,
        authors: Vec::new(),
        keywords: Vec::new(),
        tags: hub.tags.clone(),
        asset_hashes: hook.asset_hashes(),
        full_text: None,
        updated_utc: hub.updated_utc,
    }
}

/// Decode helper shared by the concrete handlers.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| SpokeError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Prefer the hook's title, falling back to the hub's display title.
pub(crate) fn pick_title(hub: &EntryHub, hook_title: &str) -> String {
    if hook_title.trim().is_empty() {
        hub.display_title.clone()
    } else {
        hook_title.to_string()
    }
}
