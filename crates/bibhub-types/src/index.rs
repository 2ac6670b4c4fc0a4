use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::EntryType;
use crate::id::EntryId;

/// Denormalized projection of hub + primary hook + extracted text.
///
/// Index records are derived data. They are rebuilt from hub and hook files
/// whenever the search index drifts and are never read back as field values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRecord {
    pub id: EntryId,
    pub entry_type: EntryType,
    pub title: String,
    pub year: Option<i32>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub journal: Option<String>,
    pub abstract_text: Option<String>,
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    pub tags: BTreeSet<String>,
    /// SHA-256 hashes of every file the entry references.
    pub asset_hashes: Vec<String>,
    pub full_text: Option<String>,
    pub updated_utc: DateTime<Utc>,
}

/// Filter for search-index queries. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Case-insensitive substring over title, abstract, authors, keywords
    /// and extracted text.
    pub text: Option<String>,
    pub entry_type: Option<EntryType>,
    /// Every tag listed must be present.
    pub tags: Vec<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub doi: Option<String>,
    pub pmid: Option<String>,
    /// Case-insensitive substring over author names.
    pub author: Option<String>,
    pub limit: Option<usize>,
}

impl SearchFilter {
    /// A filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
