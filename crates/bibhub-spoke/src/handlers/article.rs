use std::path::Path;

use async_trait::async_trait;
use bibhub_types::{CasResult, Entry, EntryHub, EntryType, HookKind, IndexRecord};

use crate::error::{Result, SpokeError};
use crate::handler::{
    apply_main_file, decode, entry_from_hub, index_record_from_hub, pick_title,
    resolve_attachments, AttachmentIngestor, SpokeHandler,
};
use crate::hooks::{ArticleHook, FileAsset, PrimaryHook};

/// Handler for publications: writes `hooks/article.json` with full
/// citation data.
#[derive(Clone, Copy, Debug, Default)]
pub struct ArticleHandler;

impl ArticleHandler {
    fn payload<'a>(&self, hook: &'a PrimaryHook) -> Result<&'a ArticleHook> {
        match hook {
            PrimaryHook::Article(h) => Ok(h),
            other => Err(SpokeError::HookMismatch {
                expected: HookKind::Article,
                found: other.kind(),
            }),
        }
    }
}

#[async_trait]
impl SpokeHandler for ArticleHandler {
    fn name(&self) -> &str {
        "article"
    }

    fn entry_types(&self) -> &[EntryType] {
        &[EntryType::Publication]
    }

    fn hook_kind(&self) -> HookKind {
        HookKind::Article
    }

    async fn build_hook(
        &self,
        entry: &Entry,
        primary: &CasResult,
        ingestor: &dyn AttachmentIngestor,
    ) -> Result<PrimaryHook> {
        Ok(PrimaryHook::Article(ArticleHook {
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            year: entry.year,
            journal: entry.journal.clone(),
            abstract_text: entry.abstract_text.clone(),
            keywords: entry.keywords.clone(),
            doi: entry.doi.clone(),
            pmid: entry.pmid.clone(),
            nct_id: entry.nct_id.clone(),
            main_file: FileAsset::from_cas(primary),
            attachments: resolve_attachments(&entry.attachments, ingestor).await?,
        }))
    }

    fn decode_hook(&self, path: &Path, bytes: &[u8]) -> Result<PrimaryHook> {
        decode(path, bytes).map(PrimaryHook::Article)
    }

    fn map_to_entry(&self, hub: &EntryHub, hook: &PrimaryHook) -> Result<Entry> {
        let h = self.payload(hook)?;
        let mut entry = entry_from_hub(hub);
        entry.title = pick_title(hub, &h.title);
        entry.authors = h.authors.clone();
        entry.year = h.year;
        entry.journal = h.journal.clone();
        entry.abstract_text = h.abstract_text.clone();
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
            journal: h.journal.clone(),
            abstract_text: h.abstract_text.clone(),
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
    use crate::hooks::DocumentHook;
    use bibhub_types::{Attachment, EntryId, Workspace};

    fn publication() -> Entry {
        Entry {
            id: Some(EntryId::new()),
            authors: vec!["Ng A".into(), "Lee B".into()],
            year: Some(2021),
            journal: Some("Lancet".into()),
            abstract_text: Some("Background...".into()),
            keywords: vec!["trial".into()],
            doi: Some("10.1000/xyz".into()),
            pmid: Some("123456".into()),
            ..Entry::new(EntryType::Publication, "A randomized trial")
        }
    }

    fn primary() -> CasResult {
        CasResult {
            relative_path: Some("ab/abcdef.pdf".into()),
            hash: Some("abcdef".into()),
            size: 42,
            original_file_name: Some("paper.pdf".into()),
        }
    }

    #[tokio::test]
    async fn build_then_map_preserves_citation_fields() {
        let entry = publication();
        let hub = hub_for(&entry);
        let hook = ArticleHandler
            .build_hook(&entry, &primary(), &FakeIngestor::default())
            .await
            .unwrap();
        assert_eq!(hook.kind(), HookKind::Article);

        let back = ArticleHandler.map_to_entry(&hub, &hook).unwrap();
        assert_eq!(back.id, entry.id);
        assert_eq!(back.title, entry.title);
        assert_eq!(back.authors, entry.authors);
        assert_eq!(back.doi, entry.doi);
        assert_eq!(back.pmid, entry.pmid);
        assert_eq!(back.journal, entry.journal);
        assert_eq!(back.main_file_path.as_deref(), Some("ab/abcdef.pdf"));
        assert_eq!(back.main_file_hash.as_deref(), Some("abcdef"));
        assert_eq!(back.original_file_name.as_deref(), Some("paper.pdf"));
    }

    #[tokio::test]
    async fn build_ingests_loose_attachments() {
        let mut entry = publication();
        entry.attachments.push(Attachment::from_source("/tmp/data.xlsx"));
        let ingestor = FakeIngestor::default();
        let hook = ArticleHandler
            .build_hook(&entry, &CasResult::empty(), &ingestor)
            .await
            .unwrap();
        assert!(hook.main_file().is_none());
        assert_eq!(hook.attachments().len(), 1);
        assert!(hook.attachments()[0].is_content_addressed());
        assert_eq!(ingestor.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn index_projection_carries_text_and_hashes() {
        let entry = publication();
        let hub = hub_for(&entry);
        let hook = ArticleHandler
            .build_hook(&entry, &primary(), &FakeIngestor::default())
            .await
            .unwrap();
        let record = ArticleHandler
            .index_contribution(&hub, &hook, Some("full body"))
            .unwrap();
        assert_eq!(record.id, hub.id);
        assert_eq!(record.year, Some(2021));
        assert_eq!(record.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(record.asset_hashes, vec!["abcdef"]);
        assert_eq!(record.full_text.as_deref(), Some("full body"));
    }

    #[tokio::test]
    async fn persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        let entry = publication();
        let id = entry.id.unwrap();
        let hook = ArticleHandler
            .build_hook(&entry, &primary(), &FakeIngestor::default())
            .await
            .unwrap();

        assert!(ArticleHandler.load_hook(&ws, &id).await.unwrap().is_none());
        ArticleHandler.persist_hook(&ws, &id, &hook).await.unwrap();
        assert!(ws.hook_path(&id, HookKind::Article).exists());
        assert_eq!(ArticleHandler.load_hook(&ws, &id).await.unwrap(), Some(hook));
    }

    #[test]
    fn rejects_foreign_hooks() {
        let entry = publication();
        let hub = hub_for(&entry);
        let foreign = PrimaryHook::Document(DocumentHook::default());
        let err = ArticleHandler.map_to_entry(&hub, &foreign).unwrap_err();
        assert!(matches!(
            err,
            SpokeError::HookMismatch {
                expected: HookKind::Article,
                found: HookKind::Document
            }
        ));
    }
}
