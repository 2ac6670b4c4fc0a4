use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bibhub_types::CasResult;

use crate::error::Result;

/// Content-addressed file store.
///
/// All implementations must satisfy these invariants:
/// - The relative path of a file is a pure function of its bytes (and its
///   extension), so identical content always lands in one place.
/// - A [`CasResult`] is never mutated after it is returned.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Ingest `source` into the store.
    ///
    /// `None` yields [`CasResult::empty`] instead of failing.
    async fn ingest(&self, source: Option<&Path>) -> Result<CasResult>;

    /// Describe a file that is already in the store.
    ///
    /// Returns `Ok(None)` if nothing is stored at `relative`.
    async fn describe(
        &self,
        relative: &str,
        original_file_name: Option<String>,
    ) -> Result<Option<CasResult>>;

    /// Absolute location of a content-store relative path.
    fn resolve(&self, relative: &str) -> PathBuf;

    /// The directory all stored files live under.
    fn root(&self) -> &Path;
}
