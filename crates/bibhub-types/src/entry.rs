use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hub::CreationMethod;
use crate::id::EntryId;

/// The closed set of record types the store knows how to persist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Journal article, preprint, book chapter: anything with citation data.
    Publication,
    /// Grey literature, internal reports, standalone documents.
    Report,
    /// A recorded literature-search run (query, provider, hit count).
    SearchRun,
    /// Anything else. Has no dedicated handler.
    #[default]
    Other,
}

impl EntryType {
    /// All variants in declaration order.
    pub const ALL: [EntryType; 4] = [
        Self::Publication,
        Self::Report,
        Self::SearchRun,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publication => "publication",
            Self::Report => "report",
            Self::SearchRun => "search_run",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "publication" | "article" => Ok(Self::Publication),
            "report" | "document" => Ok(Self::Report),
            "search_run" | "litsearch" => Ok(Self::SearchRun),
            "other" => Ok(Self::Other),
            other => Err(TypeError::UnknownEntryType(other.to_string())),
        }
    }
}

/// A file attached to an entry in addition to its primary file.
///
/// Before ingestion `path` is an absolute source path and `hash` is unset.
/// After ingestion `path` is relative to the content-store root and `hash`
/// holds the SHA-256 of the bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub title: Option<String>,
    pub path: String,
    pub hash: Option<String>,
    pub original_file_name: Option<String>,
    pub size: Option<u64>,
}

impl Attachment {
    /// An attachment that still lives at `source` and has not been ingested.
    pub fn from_source(source: impl AsRef<Path>) -> Self {
        Self {
            path: source.as_ref().to_string_lossy().into_owned(),
            ..Default::default()
        }
    }

    /// Returns `true` once the attachment points into the content store.
    pub fn is_content_addressed(&self) -> bool {
        self.hash.is_some() && !Path::new(&self.path).is_absolute()
    }
}

/// One change-log event waiting to be flushed into the `changelog` hook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEvent {
    pub id: uuid::Uuid,
    pub at_utc: DateTime<Utc>,
    pub actor: Option<String>,
    pub action: String,
    pub details: Option<String>,
}

impl ChangeLogEvent {
    /// A new event stamped with the current time.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            at_utc: Utc::now(),
            actor: None,
            action: action.into(),
            details: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Parameters of a recorded literature-search run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRunInfo {
    pub query: String,
    pub provider: Option<String>,
    pub run_utc: Option<DateTime<Utc>>,
    pub total_hits: Option<u64>,
}

/// A logical record as seen by callers.
///
/// The caller owns an `Entry` until it hands it to the store. Saving
/// assigns `id` (if unset), rewrites `main_file_path` to a content-store
/// relative path, stamps the timestamps, and drains `pending_events`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: Option<EntryId>,
    pub entry_type: EntryType,
    pub title: String,
    pub authors: Vec<String>,
    pub tags: BTreeSet<String>,
    pub year: Option<i32>,
    /// Journal for publications, publisher or institution otherwise.
    pub journal: Option<String>,
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    /// Trial-registry identifier (e.g. an NCT number).
    pub nct_id: Option<String>,
    pub main_file_path: Option<String>,
    pub main_file_hash: Option<String>,
    pub original_file_name: Option<String>,
    pub attachments: Vec<Attachment>,
    pub notes: Option<String>,
    pub search_run: Option<SearchRunInfo>,
    pub creation_method: CreationMethod,
    pub created_utc: Option<DateTime<Utc>>,
    pub updated_utc: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    #[serde(skip)]
    pub pending_events: Vec<ChangeLogEvent>,
}

impl Entry {
    /// A fresh, unsaved entry.
    pub fn new(entry_type: EntryType, title: impl Into<String>) -> Self {
        Self {
            entry_type,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_main_file(mut self, path: impl AsRef<Path>) -> Self {
        self.main_file_path = Some(path.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    pub fn with_pmid(mut self, pmid: impl Into<String>) -> Self {
        self.pmid = Some(pmid.into());
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Returns `true` when the notes carry any non-whitespace content.
    pub fn has_notes(&self) -> bool {
        self.notes.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Queue a change-log event to be flushed on the next save.
    pub fn queue_event(&mut self, event: ChangeLogEvent) {
        self.pending_events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_parses_aliases() {
        assert_eq!("Publication".parse::<EntryType>().unwrap(), EntryType::Publication);
        assert_eq!("search-run".parse::<EntryType>().unwrap(), EntryType::SearchRun);
        assert_eq!("document".parse::<EntryType>().unwrap(), EntryType::Report);
        assert!("thesis".parse::<EntryType>().is_err());
    }

    #[test]
    fn entry_type_serde_is_snake_case() {
        let json = serde_json::to_string(&EntryType::SearchRun).unwrap();
        assert_eq!(json, "\"search_run\"");
    }

    #[test]
    fn blank_notes_do_not_count() {
        let entry = Entry::new(EntryType::Report, "x").with_notes("   \n");
        assert!(!entry.has_notes());
        assert!(Entry::new(EntryType::Report, "x").with_notes("hi").has_notes());
    }

    #[test]
    fn attachment_from_source_is_not_addressed() {
        let att = Attachment::from_source("/tmp/supplement.pdf");
        assert!(!att.is_content_addressed());

        let stored = Attachment {
            path: "ab/abcd.pdf".into(),
            hash: Some("abcd".into()),
            ..Default::default()
        };
        assert!(stored.is_content_addressed());
    }

    #[test]
    fn pending_events_are_not_serialized() {
        let mut entry = Entry::new(EntryType::Other, "x");
        entry.queue_event(ChangeLogEvent::new("created"));
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("pending_events").is_none());
    }
}
