use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryType};
use crate::error::TypeError;
use crate::id::EntryId;

/// The kind of a hook file attached to a hub.
///
/// Each kind maps to exactly one file, `hooks/<kind>.json`, inside the
/// entry directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Bibliographic metadata for publications.
    Article,
    /// Generic document metadata.
    Document,
    /// Literature-search run parameters.
    #[serde(rename = "litsearch")]
    LitSearch,
    Notes,
    Attachments,
    #[serde(rename = "changelog")]
    ChangeLog,
    DataExtraction,
    PdfAnnotations,
}

impl HookKind {
    /// Kinds that can serve as an entry's primary hook, in legacy dispatch
    /// order.
    pub const PRIMARY: [HookKind; 3] = [Self::Article, Self::Document, Self::LitSearch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Document => "document",
            Self::LitSearch => "litsearch",
            Self::Notes => "notes",
            Self::Attachments => "attachments",
            Self::ChangeLog => "changelog",
            Self::DataExtraction => "data_extraction",
            Self::PdfAnnotations => "pdf_annotations",
        }
    }

    /// File name of the hook inside `hooks/`.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Path of the hook relative to the entry directory.
    pub fn relative_path(&self) -> String {
        format!("hooks/{}", self.file_name())
    }

    pub fn is_primary(&self) -> bool {
        Self::PRIMARY.contains(self)
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_ascii_lowercase().as_str() {
            "article" => Self::Article,
            "document" => Self::Document,
            "litsearch" => Self::LitSearch,
            "notes" => Self::Notes,
            "attachments" => Self::Attachments,
            "changelog" => Self::ChangeLog,
            "data_extraction" => Self::DataExtraction,
            "pdf_annotations" => Self::PdfAnnotations,
            other => return Err(TypeError::UnknownHookKind(other.to_string())),
        };
        Ok(kind)
    }
}

/// How an entry first came into the workspace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreationMethod {
    #[default]
    Manual,
    Import,
    Search,
}

/// Whether the entry describes something produced inside the workspace or
/// something published elsewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    #[default]
    Internal,
    External,
}

impl Origin {
    /// External when the entry is a publication or carries a registry id.
    pub fn infer(entry: &Entry) -> Self {
        if entry.entry_type == EntryType::Publication
            || entry.doi.is_some()
            || entry.pmid.is_some()
        {
            Self::External
        } else {
            Self::Internal
        }
    }
}

/// Coarse purpose derived from the entry type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Reference,
    Report,
    SearchRecord,
    #[default]
    Other,
}

impl Purpose {
    pub fn infer(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Publication => Self::Reference,
            EntryType::Report => Self::Report,
            EntryType::SearchRun => Self::SearchRecord,
            EntryType::Other => Self::Other,
        }
    }
}

/// The durable envelope of one entry: `entries/<id>/hub.json`.
///
/// The presence of the hub file is what makes an entry exist. Hook paths
/// are relative to the entry directory; a kind missing from `hooks` means
/// the entry has no such hook.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryHub {
    pub id: EntryId,
    pub entry_type: EntryType,
    pub display_title: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
    pub creation_method: CreationMethod,
    pub origin: Origin,
    pub purpose: Purpose,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub hooks: BTreeMap<HookKind, String>,
    /// The primary hook the entry was last saved with. Absent on hubs
    /// written before it was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<HookKind>,
}

impl EntryHub {
    /// A hub for an entry saved for the first time at `now`.
    pub fn new(id: EntryId, entry: &Entry, actor: &str, now: DateTime<Utc>) -> Self {
        Self {
            id,
            entry_type: entry.entry_type,
            display_title: entry.title.clone(),
            created_utc: now,
            updated_utc: now,
            created_by: actor.to_string(),
            updated_by: actor.to_string(),
            creation_method: entry.creation_method,
            origin: Origin::infer(entry),
            purpose: Purpose::infer(entry.entry_type),
            tags: entry.tags.clone(),
            hooks: BTreeMap::new(),
            primary: None,
        }
    }

    pub fn has_hook(&self, kind: HookKind) -> bool {
        self.hooks.contains_key(&kind)
    }

    pub fn hook_path(&self, kind: HookKind) -> Option<&str> {
        self.hooks.get(&kind).map(String::as_str)
    }

    /// Declare a hook at its canonical relative path.
    pub fn set_hook(&mut self, kind: HookKind) {
        self.hooks.insert(kind, kind.relative_path());
    }

    pub fn clear_hook(&mut self, kind: HookKind) -> bool {
        self.hooks.remove(&kind).is_some()
    }

    /// Declare `kind` and record it as the entry's primary hook.
    pub fn set_primary(&mut self, kind: HookKind) {
        self.set_hook(kind);
        self.primary = Some(kind);
    }

    /// The recorded primary hook if it is still declared, else the first
    /// primary hook kind the hub declares, in legacy dispatch order.
    pub fn declared_primary(&self) -> Option<HookKind> {
        self.primary
            .filter(|k| self.has_hook(*k))
            .or_else(|| HookKind::PRIMARY.into_iter().find(|k| self.has_hook(*k)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hub() -> EntryHub {
        let entry = Entry::new(EntryType::Report, "Demo");
        EntryHub::new(EntryId::new(), &entry, "tester", Utc::now())
    }

    #[test]
    fn hook_file_names() {
        assert_eq!(HookKind::LitSearch.file_name(), "litsearch.json");
        assert_eq!(HookKind::ChangeLog.relative_path(), "hooks/changelog.json");
        assert_eq!(HookKind::PdfAnnotations.as_str(), "pdf_annotations");
    }

    #[test]
    fn hook_kind_parse_matches_as_str() {
        for kind in [
            HookKind::Article,
            HookKind::Document,
            HookKind::LitSearch,
            HookKind::Notes,
            HookKind::Attachments,
            HookKind::ChangeLog,
            HookKind::DataExtraction,
            HookKind::PdfAnnotations,
        ] {
            assert_eq!(kind.as_str().parse::<HookKind>().unwrap(), kind);
        }
    }

    #[test]
    fn hub_hooks_serialize_as_named_keys() {
        let mut hub = sample_hub();
        hub.set_hook(HookKind::Document);
        hub.set_hook(HookKind::ChangeLog);
        let json = serde_json::to_value(&hub).unwrap();
        assert_eq!(json["hooks"]["document"], "hooks/document.json");
        assert_eq!(json["hooks"]["changelog"], "hooks/changelog.json");
        assert!(json["hooks"].get("notes").is_none());

        let back: EntryHub = serde_json::from_value(json).unwrap();
        assert_eq!(back, hub);
    }

    #[test]
    fn declared_primary_follows_dispatch_order() {
        let mut hub = sample_hub();
        assert_eq!(hub.declared_primary(), None);
        hub.set_hook(HookKind::LitSearch);
        hub.set_hook(HookKind::Document);
        assert_eq!(hub.declared_primary(), Some(HookKind::Document));
        hub.clear_hook(HookKind::Document);
        assert_eq!(hub.declared_primary(), Some(HookKind::LitSearch));
    }

    #[test]
    fn recorded_primary_beats_dispatch_order() {
        let mut hub = sample_hub();
        hub.set_primary(HookKind::Document);
        hub.set_hook(HookKind::Article);
        assert_eq!(hub.declared_primary(), Some(HookKind::Document));

        // A recorded kind that is no longer declared is ignored.
        hub.clear_hook(HookKind::Document);
        assert_eq!(hub.declared_primary(), Some(HookKind::Article));

        let json = serde_json::to_value(&sample_hub()).unwrap();
        assert!(json.get("primary").is_none());
    }

    #[test]
    fn classification_is_inferred() {
        let article = Entry::new(EntryType::Publication, "A");
        let report = Entry::new(EntryType::Report, "R");
        assert_eq!(Origin::infer(&article), Origin::External);
        assert_eq!(Origin::infer(&report), Origin::Internal);
        assert_eq!(Origin::infer(&report.clone().with_doi("10.1/x")), Origin::External);
        assert_eq!(Purpose::infer(EntryType::SearchRun), Purpose::SearchRecord);
    }
}
