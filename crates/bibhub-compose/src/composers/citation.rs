use async_trait::async_trait;
use bibhub_spoke::{read_json, write_json, ArticleHook};
use bibhub_types::{EntryId, HookKind, Workspace};

use crate::composer::HookComposer;
use crate::context::HookContext;
use crate::error::{ComposeError, ComposeResult};

/// Merges citation data into `hooks/article.json`.
///
/// Fields the citation leaves blank keep their stored values, and the
/// stored main file and attachments are never replaced.
pub struct CitationComposer;

fn merge(existing: ArticleHook, citation: &ArticleHook) -> ArticleHook {
    ArticleHook {
        title: if citation.title.trim().is_empty() {
            existing.title
        } else {
            citation.title.clone()
        },
        authors: if citation.authors.is_empty() {
            existing.authors
        } else {
            citation.authors.clone()
        },
        year: citation.year.or(existing.year),
        journal: citation.journal.clone().or(existing.journal),
        abstract_text: citation.abstract_text.clone().or(existing.abstract_text),
        keywords: if citation.keywords.is_empty() {
            existing.keywords
        } else {
            citation.keywords.clone()
        },
        doi: citation.doi.clone().or(existing.doi),
        pmid: citation.pmid.clone().or(existing.pmid),
        nct_id: citation.nct_id.clone().or(existing.nct_id),
        main_file: existing.main_file,
        attachments: existing.attachments,
    }
}

#[async_trait]
impl HookComposer for CitationComposer {
    fn name(&self) -> &str {
        "citation"
    }

    fn kind(&self) -> HookKind {
        HookKind::Article
    }

    fn can_compose(&self, context: &HookContext) -> bool {
        context.citation.is_some()
    }

    async fn persist(
        &self,
        workspace: &Workspace,
        id: &EntryId,
        context: &HookContext,
    ) -> ComposeResult<()> {
        let citation = context
            .citation
            .as_ref()
            .ok_or_else(|| ComposeError::NotApplicable {
                composer: self.name().into(),
            })?;
        let path = workspace.hook_path(id, self.kind());
        let merged = match read_json::<ArticleHook>(&path)
            .await
            .map_err(|e| ComposeError::persist(self.kind(), e))?
        {
            Some(existing) => merge(existing, citation),
            None => ArticleHook {
                main_file: None,
                attachments: Vec::new(),
                ..citation.clone()
            },
        };
        write_json(&path, &merged)
            .await
            .map_err(|e| ComposeError::persist(self.kind(), e))
    }
}
