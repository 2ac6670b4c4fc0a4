use std::path::Path;

use async_trait::async_trait;
use bibhub_types::{CasResult, Entry, EntryHub, EntryType, HookKind, IndexRecord, SearchRunInfo};
use chrono::Datelike;

use crate::error::{Result, SpokeError};
use crate::handler::{
    apply_main_file, decode, entry_from_hub, index_record_from_hub, pick_title,
    resolve_attachments, AttachmentIngestor, SpokeHandler,
};
use crate::hooks::{FileAsset, LitSearchHook, PrimaryHook};

/// Handler for recorded literature-search runs (`hooks/litsearch.json`).
#[derive(Clone, Copy, Debug, Default)]
pub struct LitSearchHandler;

impl LitSearchHandler {
    fn payload<'a>(&self, hook: &'a PrimaryHook) -> Result<&'a LitSearchHook> {
        match hook {
            PrimaryHook::LitSearch(h) => Ok(h),
            other => Err(SpokeError::HookMismatch {
                expected: HookKind::LitSearch,
                found: other.kind(),
            }),
        }
    }
}

fn run_info(h: &LitSearchHook) -> Option<SearchRunInfo> {
    if h.query.is_empty() && h.provider.is_none() && h.run_utc.is_none() && h.total_hits.is_none()
    {
        return None;
    }
    Some(SearchRunInfo {
        query: h.query.clone(),
        provider: h.provider.clone(),
        run_utc: h.run_utc,
        total_hits: h.total_hits,
    })
}

#[async_trait]
impl SpokeHandler for LitSearchHandler {
    fn name(&self) -> &str {
        "litsearch"
    }

    fn entry_types(&self) -> &[EntryType] {
        &[EntryType::SearchRun]
    }

    fn hook_kind(&self) -> HookKind {
        HookKind::LitSearch
    }

    async fn build_hook(
        &self,
        entry: &Entry,
        primary: &CasResult,
        ingestor: &dyn AttachmentIngestor,
    ) -> Result<PrimaryHook> {
        let run = entry.search_run.clone().unwrap_or_default();
        Ok(PrimaryHook::LitSearch(LitSearchHook {
            title: entry.title.clone(),
            authors: entry.authors.clone(),
            year: entry.year,
            journal: entry.journal.clone(),
            abstract_text: entry.abstract_text.clone(),
            doi: entry.doi.clone(),
            pmid: entry.pmid.clone(),
            nct_id: entry.nct_id.clone(),
            query: run.query,
            provider: run.provider,
            run_utc: run.run_utc,
            total_hits: run.total_hits,
            keywords: entry.keywords.clone(),
            main_file: FileAsset::from_cas(primary),
            attachments: resolve_attachments(&entry.attachments, ingestor).await?,
        }))
    }

    fn decode_hook(&self, path: &Path, bytes: &[u8]) -> Result<PrimaryHook> {
        decode(path, bytes).map(PrimaryHook::LitSearch)
    }

    fn map_to_entry(&self, hub: &EntryHub, hook: &PrimaryHook) -> Result<Entry> {
        let h = self.payload(hook)?;
        let mut entry = entry_from_hub(hub);
        entry.title = pick_title(hub, &h.title);
        entry.authors = h.authors.clone();
        entry.year = h.year;
        entry.journal = h.journal.clone();
        entry.abstract_text = h.abstract_text.clone();
        entry.doi = h.doi.clone();
        entry.pmid = h.pmid.clone();
        entry.nct_id = h.nct_id.clone();
        entry.keywords = h.keywords.clone();
        entry.search_run = run_info(h);
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
        // Runs without their own bibliographic fields index as the search.
        Ok(IndexRecord {
            title: pick_title(hub, &h.title),
            year: h.year.or_else(|| h.run_utc.map(|t| t.year())),
            doi: h.doi.clone(),
            pmid: h.pmid.clone(),
            journal: h.journal.clone().or_else(|| h.provider.clone()),
            abstract_text: h
                .abstract_text
                .clone()
                .or_else(|| (!h.query.is_empty()).then(|| h.query.clone())),
            authors: h.authors.clone(),
            keywords: h.keywords.clone(),
            full_text: extracted_text.map(str::to_string),
            ..index_record_from_hub(hub, hook)
        })
    }
}
