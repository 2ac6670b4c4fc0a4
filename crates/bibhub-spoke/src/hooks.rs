use std::path::Path;

use bibhub_types::{Attachment, CasResult, ChangeLogEvent, HookKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::io::write_json;

/// A content-addressed file referenced from a hook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAsset {
    /// Path relative to the content-store root.
    pub path: String,
    pub hash: String,
    pub size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
}

impl FileAsset {
    /// `None` for the empty result.
    pub fn from_cas(result: &CasResult) -> Option<Self> {
        Some(Self {
            path: result.relative_path.clone()?,
            hash: result.hash.clone()?,
            size: result.size,
            original_file_name: result.original_file_name.clone(),
        })
    }
}

/// Bibliographic metadata: `hooks/article.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleHook {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub nct_id: Option<String>,
    pub main_file: Option<FileAsset>,
    pub attachments: Vec<Attachment>,
}

/// Generic document metadata: `hooks/document.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentHook {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub publisher: Option<String>,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub nct_id: Option<String>,
    pub main_file: Option<FileAsset>,
    pub attachments: Vec<Attachment>,
}

/// A recorded literature search: `hooks/litsearch.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LitSearchHook {
    pub title: String,
    pub authors: Vec<String>,
    pub year: Option<i32>,
    pub journal: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub nct_id: Option<String>,
    pub query: String,
    pub provider: Option<String>,
    pub run_utc: Option<DateTime<Utc>>,
    pub total_hits: Option<u64>,
    pub keywords: Vec<String>,
    pub main_file: Option<FileAsset>,
    pub attachments: Vec<Attachment>,
}

/// Free-form notes: `hooks/notes.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesHook {
    pub text: String,
    pub updated_utc: DateTime<Utc>,
}

/// Attachment manifest written by the attachment-list composer:
/// `hooks/attachments.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentsHook {
    pub attachments: Vec<Attachment>,
}

/// Change-log entries: `hooks/changelog.json`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeLogHook {
    pub events: Vec<ChangeLogEvent>,
}

impl ChangeLogHook {
    /// Append events whose ids are not yet present. Returns the number
    /// appended.
    pub fn append(&mut self, events: &[ChangeLogEvent]) -> usize {
        let mut added = 0;
        for event in events {
            if !self.events.iter().any(|e| e.id == event.id) {
                self.events.push(event.clone());
                added += 1;
            }
        }
        added
    }
}

/// The primary payload of an entry, one variant per primary hook kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrimaryHook {
    Article(ArticleHook),
    Document(DocumentHook),
    LitSearch(LitSearchHook),
}

impl PrimaryHook {
    pub fn kind(&self) -> HookKind {
        match self {
            Self::Article(_) => HookKind::Article,
            Self::Document(_) => HookKind::Document,
            Self::LitSearch(_) => HookKind::LitSearch,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Article(h) => &h.title,
            Self::Document(h) => &h.title,
            Self::LitSearch(h) => &h.title,
        }
    }

    pub fn main_file(&self) -> Option<&FileAsset> {
        match self {
            Self::Article(h) => h.main_file.as_ref(),
            Self::Document(h) => h.main_file.as_ref(),
            Self::LitSearch(h) => h.main_file.as_ref(),
        }
    }

    pub fn attachments(&self) -> &[Attachment] {
        match self {
            Self::Article(h) => &h.attachments,
            Self::Document(h) => &h.attachments,
            Self::LitSearch(h) => &h.attachments,
        }
    }

    /// Hashes of the main file and every attachment, main file first.
    pub fn asset_hashes(&self) -> Vec<String> {
        self.main_file()
            .map(|f| f.hash.clone())
            .into_iter()
            .chain(self.attachments().iter().filter_map(|a| a.hash.clone()))
            .collect()
    }

    /// Write the payload (without an enum tag) to `path`.
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        match self {
            Self::Article(h) => write_json(path, h).await,
            Self::Document(h) => write_json(path, h).await,
            Self::LitSearch(h) => write_json(path, h).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(hash: &str) -> FileAsset {
        FileAsset {
            path: format!("{}/{hash}", &hash[..2]),
            hash: hash.into(),
            size: 1,
            original_file_name: None,
        }
    }

    #[test]
    fn file_asset_from_empty_cas_is_none() {
        assert!(FileAsset::from_cas(&CasResult::empty()).is_none());
    }

    #[test]
    fn asset_hashes_list_main_file_first() {
        let hook = PrimaryHook::Document(DocumentHook {
            main_file: Some(asset("aa11")),
            attachments: vec![
                Attachment {
                    path: "bb/bb22".into(),
                    hash: Some("bb22".into()),
                    ..Default::default()
                },
                Attachment::from_source("/not/ingested"),
            ],
            ..Default::default()
        });
        assert_eq!(hook.asset_hashes(), vec!["aa11", "bb22"]);
    }

    #[test]
    fn article_abstract_uses_plain_key() {
        let hook = ArticleHook {
            abstract_text: Some("We show...".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&hook).unwrap();
        assert_eq!(json["abstract"], "We show...");
    }

    #[test]
    fn missing_fields_default() {
        let hook: DocumentHook = serde_json::from_str(r#"{"title":"Old"}"#).unwrap();
        assert_eq!(hook.title, "Old");
        assert!(hook.attachments.is_empty());
    }

    #[test]
    fn changelog_append_skips_known_ids() {
        let a = ChangeLogEvent::new("created");
        let b = ChangeLogEvent::new("edited");
        let mut log = ChangeLogHook::default();
        assert_eq!(log.append(&[a.clone()]), 1);
        assert_eq!(log.append(&[a, b]), 1);
        assert_eq!(log.events.len(), 2);
    }
}
