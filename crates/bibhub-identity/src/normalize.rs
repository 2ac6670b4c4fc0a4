//! Identifier normalization strategies.
//!
//! Two records refer to the same work when their normalized DOI (or, failing
//! that, PMID) agree. The normalizer is injected into the index so the
//! policy can change without touching lookup code.

use std::sync::OnceLock;

use regex::Regex;

/// Maps raw identifier strings to canonical lookup keys.
///
/// Returning `None` means "not a usable identifier"; such values are never
/// indexed.
pub trait IdentifierNormalizer: Send + Sync {
    fn normalize_doi(&self, raw: &str) -> Option<String>;
    fn normalize_pmid(&self, raw: &str) -> Option<String>;
}

fn doi_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"10\.\d{4,9}/[^\s]+").expect("static DOI pattern"))
}

/// Extracts the `10.<registrant>/<suffix>` core from whatever wraps it
/// (`doi:` prefixes, `https://doi.org/` URLs), trims trailing punctuation,
/// and lowercases. PMIDs keep their digits only.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNormalizer;

impl IdentifierNormalizer for DefaultNormalizer {
    fn normalize_doi(&self, raw: &str) -> Option<String> {
        let found = doi_pattern().find(raw)?;
        let doi = found
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', ')', ']', '"', '\''])
            .to_lowercase();
        (!doi.ends_with('/')).then_some(doi)
    }

    fn normalize_pmid(&self, raw: &str) -> Option<String> {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        (!digits.is_empty()).then_some(digits)
    }
}

/// Trim and lowercase only. Matches keys written by older workspaces that
/// never extracted the DOI core.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyNormalizer;

impl IdentifierNormalizer for LegacyNormalizer {
    fn normalize_doi(&self, raw: &str) -> Option<String> {
        let doi = raw.trim().to_lowercase();
        (!doi.is_empty()).then_some(doi)
    }

    fn normalize_pmid(&self, raw: &str) -> Option<String> {
        let pmid = raw.trim();
        (!pmid.is_empty()).then(|| pmid.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_prefixes_and_case() {
        let n = DefaultNormalizer;
        let want = Some("10.1000/xyz".to_string());
        assert_eq!(n.normalize_doi("10.1000/xyz"), want);
        assert_eq!(n.normalize_doi("DOI:10.1000/XYZ"), want);
        assert_eq!(n.normalize_doi("doi: 10.1000/xyz."), want);
        assert_eq!(n.normalize_doi("https://doi.org/10.1000/XYZ"), want);
        assert_eq!(n.normalize_doi("http://dx.doi.org/10.1000/xyz"), want);
        assert_eq!(n.normalize_doi("(10.1000/xyz)"), want);
    }

    #[test]
    fn rejects_non_dois() {
        let n = DefaultNormalizer;
        assert_eq!(n.normalize_doi(""), None);
        assert_eq!(n.normalize_doi("not a doi"), None);
        assert_eq!(n.normalize_doi("10.12/short-registrant"), None);
    }

    #[test]
    fn pmid_keeps_digits() {
        let n = DefaultNormalizer;
        assert_eq!(n.normalize_pmid("PMID: 12345678"), Some("12345678".into()));
        assert_eq!(n.normalize_pmid(" 42 "), Some("42".into()));
        assert_eq!(n.normalize_pmid("n/a"), None);
    }

    #[test]
    fn legacy_only_trims_and_lowercases() {
        let n = LegacyNormalizer;
        assert_eq!(n.normalize_doi(" DOI:10.1/X "), Some("doi:10.1/x".into()));
        assert_eq!(n.normalize_doi("   "), None);
        assert_eq!(n.normalize_pmid(" PMID1 "), Some("PMID1".into()));
    }

    fn doi_strategy() -> impl Strategy<Value = String> {
        ("[0-9]{4,9}", "[A-Za-z0-9._\\-/]{0,20}[A-Za-z0-9]")
            .prop_map(|(registrant, suffix)| format!("10.{registrant}/{suffix}"))
    }

    proptest! {
        #[test]
        fn doi_normalization_is_idempotent(doi in doi_strategy()) {
            let n = DefaultNormalizer;
            let once = n.normalize_doi(&doi).unwrap();
            prop_assert_eq!(n.normalize_doi(&once), Some(once.clone()));
        }

        #[test]
        fn doi_wrappers_and_case_do_not_matter(
            doi in doi_strategy(),
            prefix in prop::sample::select(vec!["", "doi:", "DOI: ", "https://doi.org/", "http://dx.doi.org/"]),
        ) {
            let n = DefaultNormalizer;
            let wrapped = format!("{prefix}{}", doi.to_uppercase());
            prop_assert_eq!(n.normalize_doi(&wrapped), n.normalize_doi(&doi));
        }

        #[test]
        fn pmid_output_is_all_digits(raw in ".{0,24}") {
            if let Some(pmid) = DefaultNormalizer.normalize_pmid(&raw) {
                prop_assert!(pmid.chars().all(|c| c.is_ascii_digit()));
            }
        }
    }
}
