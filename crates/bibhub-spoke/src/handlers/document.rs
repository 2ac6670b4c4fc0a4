use std::path::Path;

use async_trait::async_trait;
use bibhub_types::{CasResult, Entry, EntryHub, EntryType, HookKind, IndexRecord};

use crate::error::{Result, SpokeError};
use crate::handler::{
    apply_main_file, decode, entry_from_hub, index_record_from_hub, pick_title,
    resolve_attachments, AttachmentIngestor, SpokeHandler,
};
use crate::hooks::{DocumentHook, FileAsset, PrimaryHook};

/// Handler for reports and any type without a dedicated handler.
///
/// The registry falls back to this handler, so it maps every entry field it
/// can hold: `journal` travels as `publisher` and `abstract_text` as
/// `summary`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentHandler;

impl DocumentHandler {
    fn payload<'a>(&self, hook: &'a PrimaryHook) -> Result<&'a DocumentHook> {
        match hook {
            PrimaryHook::Document(h) => Ok(h),
            other => Err(SpokeError::HookMismatch {
                expected: HookKind::Document,
                found: other.kind(),
            }),
        }
    }
}

#[async_trait]
impl SpokeHandler for DocumentHandler {
    fn name(&self) -> &str {
        "document"
    }

    fn entry_types(&self) -> &[EntryType] {
        &[EntryType::Report]
    }

    fn hook_kind(&self) -> HookKind {
        HookKind::Document
    }

    async fn build_hook(
        &self,
        entry: &Entry,
        primary: &CasResult,
        ingestor: &dyn AttachmentIngestor,
    ) -> Result<PrimaryHook> {
        Ok(PrimaryHook::Document(DocumentHook {
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            year: entry.year,
            publisher: entry.journal.clone(),
            summary: entry.abstract_text.clone(),
            keywords: entry.keywords.clone(),
            doi: entry.doi.clone(),
            pmid: entry.pmid.clone(),
            nct_id: entry.nct_id.clone(),
            main_file: FileAsset::from_cas(primary),
            attachments: resolve_attachments(&entry.attachments, ingestor).await?,
        }))
    }

    fn decode_hook(&self, path: &Path, bytes: &[u8]) -> Result<PrimaryHook> {
        decode(path, bytes).map(PrimaryHook::Document)
    }

    fn map_to_entry(&self, hub: &EntryHub, hook: &PrimaryHook) -> Result<Entry> {
        let h = self.payload(hook)?;
        let mut entry = entry_from_hub(hub);
        entry.title = pick_title(hub, &h.title);
        entry.authors = h.authors.clone();
        entry.year = h.year;
        entry.journal = h.publisher.clone();
        entry.abstract_text = h.summary.clone();
        entry.keywords = h.keywords.clone();
        entry.doi = h.doi.clone();
        entry.pmid = h.pmid.clone();
        entry.nct_id = h.nct_id.clone();
        apply_main_file(&mut entry, hook);
        Ok(entry)
    }

    fn index_contribution(
        &self,
        hub: &EntryHub,
        hook: &PrimaryHook,
        extracted_text: Option<&str>,
    ) -> Result<IndexRecord> {
        let h = self.payload(hook)?;
        Ok(IndexRecord {
            title: pick_title(hub, &h.title),
            year: h.year,
            doi: h.doi.clone(),
            pmid: h.pmid.clone(),
            journal: h.publisher.clone(),
            abstract_text: h.summary.clone(),
            authors: h.authors.clone(),
            keywords: h.keywords.clone(),
            full_text: extracted_text.map(str::to_string),
            ..index_record_from_hub(hub, hook)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::{hub_for, FakeIngestor};
    use bibhub_types::EntryId;

    #[tokio::test]
    async fn other_type_maps_through_document_fields() {
        let entry = Entry {
            id: Some(EntryId::new()),
            journal: Some("WHO".into()),
            abstract_text: Some("Summary text".into()),
            year: Some(2019),
            ..Entry::new(EntryType::Other, "Guidance note")
        };
        let hub = hub_for(&entry);
        let hook = DocumentHandler
            .build_hook(&entry, &CasResult::empty(), &FakeIngestor::default())
            .await
            .unwrap();

        let PrimaryHook::Document(payload) = &hook else {
            panic!("expected document hook");
        };
        assert_eq!(payload.publisher.as_deref(), Some("WHO"));
        assert_eq!(payload.summary.as_deref(), Some("Summary text"));

        let back = DocumentHandler.map_to_entry(&hub, &hook).unwrap();
        assert_eq!(back.entry_type, EntryType::Other);
        assert_eq!(back.journal, entry.journal);
        assert_eq!(back.abstract_text, entry.abstract_text);
        assert_eq!(back.year, Some(2019));
        assert!(back.main_file_path.is_none());
    }

    #[test]
    fn blank_hook_title_falls_back_to_hub() {
        let entry = Entry::new(EntryType::Report, "From hub");
        let hub = hub_for(&entry);
        let hook = PrimaryHook::Document(DocumentHook::default());
        let back = DocumentHandler.map_to_entry(&hub, &hook).unwrap();
        assert_eq!(back.title, "From hub");
        let record = DocumentHandler.index_contribution(&hub, &hook, None).unwrap();
        assert_eq!(record.title, "From hub");
        assert!(record.full_text.is_none());
    }
}
