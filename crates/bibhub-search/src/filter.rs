//! Filter evaluation against a single [`IndexRecord`].

use bibhub_types::{IndexRecord, SearchFilter};

/// Returns `true` if `record` satisfies every criterion set on `filter`.
///
/// Free text is split on whitespace; every term must appear (case-folded)
/// in the title, abstract, journal, authors, keywords, tags, or full text.
pub fn matches(record: &IndexRecord, filter: &SearchFilter) -> bool {
    if filter.entry_type.is_some_and(|t| t != record.entry_type) {
        return false;
    }
    if !filter.tags.iter().all(|t| record.tags.contains(t)) {
        return false;
    }
    if let Some(from) = filter.year_from {
        if !record.year.is_some_and(|y| y >= from) {
            return false;
        }
    }
    if let Some(to) = filter.year_to {
        if !record.year.is_some_and(|y| y <= to) {
            return false;
        }
    }
    if !identifier_matches(filter.doi.as_deref(), record.doi.as_deref()) {
        return false;
    }
    if !identifier_matches(filter.pmid.as_deref(), record.pmid.as_deref()) {
        return false;
    }
    if let Some(author) = filter.author.as_deref() {
        let needle = author.trim().to_lowercase();
        if !record
            .authors
            .iter()
            .any(|a| a.to_lowercase().contains(&needle))
        {
            return false;
        }
    }
    match filter.text.as_deref() {
        Some(text) if !text.trim().is_empty() => text_matches(record, text),
        _ => true,
    }
}

fn identifier_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match (wanted, actual) {
        (None, _) => true,
        (Some(w), Some(a)) => w.trim().eq_ignore_ascii_case(a.trim()),
        (Some(_), None) => false,
    }
}

fn text_matches(record: &IndexRecord, text: &str) -> bool {
    let haystack = haystack(record);
    text.split_whitespace()
        .map(str::to_lowercase)
        .all(|term| haystack.contains(&term))
}

fn haystack(record: &IndexRecord) -> String {
    let mut parts: Vec<&str> = vec![record.title.as_str()];
    parts.extend(record.abstract_text.as_deref());
    parts.extend(record.journal.as_deref());
    parts.extend(record.authors.iter().map(String::as_str));
    parts.extend(record.keywords.iter().map(String::as_str));
    parts.extend(record.tags.iter().map(String::as_str));
    parts.extend(record.full_text.as_deref());
    parts.join("\n").to_lowercase()
}
