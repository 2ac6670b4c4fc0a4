use serde::{Deserialize, Serialize};

/// Result of ingesting one file into the content store.
///
/// `relative_path` is relative to the content-store root and always uses
/// `/` separators. The empty result (no path, no hash) stands for "this
/// entry has no file".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasResult {
    pub relative_path: Option<String>,
    /// Lowercase hex SHA-256 of the file bytes.
    pub hash: Option<String>,
    pub size: u64,
    pub original_file_name: Option<String>,
}

impl CasResult {
    /// The result for "no file".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_path.is_none() && self.hash.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result() {
        let r = CasResult::empty();
        assert!(r.is_empty());
        assert_eq!(r.size, 0);

        let full = CasResult {
            relative_path: Some("ab/ab12.pdf".into()),
            hash: Some("ab12".into()),
            size: 4,
            original_file_name: Some("paper.pdf".into()),
        };
        assert!(!full.is_empty());
    }
}
