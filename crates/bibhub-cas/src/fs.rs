use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bibhub_types::CasResult;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{CasError, Result};
use crate::hasher::{Hasher, Sha256Hasher};
use crate::traits::ContentStore;

/// Length of the hash prefix used as the shard directory name.
const SHARD_PREFIX_LEN: usize = 2;

/// What happens to the source file after ingestion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestMode {
    /// Rename into the store (copy + delete across volumes).
    #[default]
    Move,
    /// Leave the source untouched.
    Copy,
}

/// Content store on the local file system.
///
/// Files live at `<root>/<hh>/<sha256>` where `hh` is the first two hex
/// characters of the hash. The path depends on the bytes alone; the source
/// name is only reported back in [`CasResult::original_file_name`]. Writes go through a temporary file in the
/// shard directory followed by a rename, so a crash never leaves a
/// truncated file under a final name.
pub struct FsContentStore {
    root: PathBuf,
    mode: IngestMode,
    hasher: Arc<dyn Hasher>,
}

impl FsContentStore {
    /// A store at `root` hashing with SHA-256.
    pub fn new(root: impl Into<PathBuf>, mode: IngestMode) -> Self {
        Self::with_hasher(root, mode, Arc::new(Sha256Hasher))
    }

    pub fn with_hasher(root: impl Into<PathBuf>, mode: IngestMode, hasher: Arc<dyn Hasher>) -> Self {
        Self {
            root: root.into(),
            mode,
            hasher,
        }
    }

    pub fn mode(&self) -> IngestMode {
        self.mode
    }

    /// The relative storage path for content with `hash`.
    pub fn relative_path_for(hash: &str) -> String {
        let shard = &hash[..SHARD_PREFIX_LEN.min(hash.len())];
        format!("{shard}/{hash}")
    }

    /// Whether `dest` already holds content hashing to `hash`.
    async fn holds(&self, dest: &Path, hash: &str) -> bool {
        match fs::metadata(dest).await {
            Ok(meta) if meta.is_file() => {}
            _ => return false,
        }
        match self.hasher.sha256(dest).await {
            Ok(existing) if existing.eq_ignore_ascii_case(hash) => true,
            Ok(_) => {
                warn!(path = %dest.display(), "stored file does not match its hash, rewriting");
                false
            }
            Err(e) => {
                warn!(path = %dest.display(), error = %e, "cannot hash stored file, rewriting");
                false
            }
        }
    }

    async fn place(&self, source: &Path, dest: &Path) -> Result<()> {
        match self.mode {
            IngestMode::Copy => copy_atomic(source, dest).await,
            IngestMode::Move => match fs::rename(source, dest).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    debug!(error = %e, source = %source.display(), "rename failed, copying instead");
                    copy_atomic(source, dest).await?;
                    fs::remove_file(source).await?;
                    Ok(())
                }
            },
        }
    }
}

impl std::fmt::Debug for FsContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsContentStore")
            .field("root", &self.root)
            .field("mode", &self.mode)
            .finish()
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn ingest(&self, source: Option<&Path>) -> Result<CasResult> {
        let Some(source) = source else {
            return Ok(CasResult::empty());
        };

        let meta = fs::metadata(source).await?;
        if !meta.is_file() {
            return Err(CasError::NotAFile(source.to_path_buf()));
        }
        let size = meta.len();
        let hash = self.hasher.sha256(source).await?;
        let relative = Self::relative_path_for(&hash);
        let dest = self.resolve(&relative);
        let original_file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        let result = CasResult {
            relative_path: Some(relative),
            hash: Some(hash.clone()),
            size,
            original_file_name,
        };

        if same_file(source, &dest).await {
            return Ok(result);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        if self.holds(&dest, &hash).await {
            debug!(path = %dest.display(), "content already stored, skipping write");
            if self.mode == IngestMode::Move {
                fs::remove_file(source).await?;
            }
        } else {
            self.place(source, &dest).await?;
            debug!(path = %dest.display(), size, "ingested file");
        }

        Ok(result)
    }

    async fn describe(
        &self,
        relative: &str,
        original_file_name: Option<String>,
    ) -> Result<Option<CasResult>> {
        validate_relative(relative)?;
        let path = self.resolve(relative);
        let meta = match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let hash = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.split('.').next())
            .map(str::to_string);
        Ok(Some(CasResult {
            relative_path: Some(relative.to_string()),
            hash,
            size: meta.len(),
            original_file_name,
        }))
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in relative.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }

    fn root(&self) -> &Path {
        &self.root
    }
}

fn validate_relative(relative: &str) -> Result<()> {
    let path = Path::new(relative);
    let ok = !relative.trim().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if ok {
        Ok(())
    } else {
        Err(CasError::InvalidPath(relative.to_string()))
    }
}

async fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a).await, fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

async fn copy_atomic(source: &Path, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| CasError::InvalidPath(dest.display().to_string()))?;
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{name}.{}.partial", uuid::Uuid::now_v7().simple()));

    fs::copy(source, &tmp).await?;
    if let Err(e) = fs::rename(&tmp, dest).await {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            warn!(error = %cleanup, path = %tmp.display(), "failed to remove partial file");
        }
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, data).await.unwrap();
        path
    }

    #[tokio::test]
    async fn ingest_none_yields_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let result = store.ingest(None).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn ingest_shards_by_hash_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let src = write(dir.path(), "Paper.PDF", b"%PDF-1.4 demo").await;

        let result = store.ingest(Some(&src)).await.unwrap();
        let hash = Sha256Hasher::hash_bytes(b"%PDF-1.4 demo");
        assert_eq!(result.hash.as_deref(), Some(hash.as_str()));
        assert_eq!(
            result.relative_path.as_deref(),
            Some(format!("{}/{}", &hash[..2], hash).as_str())
        );
        assert_eq!(result.size, 13);
        assert_eq!(result.original_file_name.as_deref(), Some("Paper.PDF"));

        let stored = fs::read(store.resolve(result.relative_path.as_deref().unwrap()))
            .await
            .unwrap();
        assert_eq!(stored, b"%PDF-1.4 demo");
        // Copy mode leaves the source alone.
        assert!(src.exists());
    }

    #[tokio::test]
    async fn move_mode_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Move);
        let src = write(dir.path(), "a.txt", b"moved bytes").await;

        let result = store.ingest(Some(&src)).await.unwrap();
        assert!(!src.exists());
        assert!(store.resolve(result.relative_path.as_deref().unwrap()).exists());
    }

    #[tokio::test]
    async fn identical_bytes_share_one_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Move);
        let first = write(dir.path(), "one.txt", b"same content").await;
        let second = write(dir.path(), "two.txt", b"same content").await;

        let r1 = store.ingest(Some(&first)).await.unwrap();
        let r2 = store.ingest(Some(&second)).await.unwrap();
        assert_eq!(r1.relative_path, r2.relative_path);
        assert_eq!(r1.hash, r2.hash);
        assert_ne!(r1.original_file_name, r2.original_file_name);
        // Deduplicated ingestion still consumes the source in move mode.
        assert!(!second.exists());
    }

    #[tokio::test]
    async fn reingesting_same_path_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let src = write(dir.path(), "note.md", b"# notes").await;

        let r1 = store.ingest(Some(&src)).await.unwrap();
        let r2 = store.ingest(Some(&src)).await.unwrap();
        assert_eq!(r1, r2);
    }

    #[tokio::test]
    async fn ingesting_a_stored_file_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Move);
        let src = write(dir.path(), "x.bin", b"xyz").await;
        let r1 = store.ingest(Some(&src)).await.unwrap();

        let stored = store.resolve(r1.relative_path.as_deref().unwrap());
        let r2 = store.ingest(Some(&stored)).await.unwrap();
        assert_eq!(r1.relative_path, r2.relative_path);
        assert!(stored.exists());
    }

    #[tokio::test]
    async fn extension_does_not_change_location() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let pdf = write(dir.path(), "a.pdf", b"same bytes, two names").await;
        let bin = write(dir.path(), "b.bin", b"same bytes, two names").await;

        let r1 = store.ingest(Some(&pdf)).await.unwrap();
        let r2 = store.ingest(Some(&bin)).await.unwrap();
        assert_eq!(r1.relative_path, r2.relative_path);
        assert_eq!(r1.original_file_name.as_deref(), Some("a.pdf"));
        assert_eq!(r2.original_file_name.as_deref(), Some("b.bin"));
        assert_eq!(FsContentStore::relative_path_for("abcdef"), "ab/abcdef");
    }

    #[tokio::test]
    async fn damaged_stored_copy_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let src = write(dir.path(), "good.txt", b"GOOD BYTES").await;
        let result = store.ingest(Some(&src)).await.unwrap();
        let stored = store.resolve(result.relative_path.as_deref().unwrap());

        // Same length, different content.
        fs::write(&stored, b"BAD  BYTES").await.unwrap();
        store.ingest(Some(&src)).await.unwrap();
        assert_eq!(fs::read(&stored).await.unwrap(), b"GOOD BYTES");
    }

    #[tokio::test]
    async fn directory_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let err = store.ingest(Some(dir.path())).await.unwrap_err();
        assert!(matches!(err, CasError::NotAFile(_)));
    }

    #[tokio::test]
    async fn missing_source_propagates_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let err = store
            .ingest(Some(&dir.path().join("missing.pdf")))
            .await
            .unwrap_err();
        assert!(matches!(err, CasError::Io(_)));
    }

    #[tokio::test]
    async fn describe_existing_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let src = write(dir.path(), "d.txt", b"describe me").await;
        let ingested = store.ingest(Some(&src)).await.unwrap();
        let rel = ingested.relative_path.clone().unwrap();

        let described = store
            .describe(&rel, Some("d.txt".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(described, ingested);

        assert!(store.describe("zz/zzzz", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn describe_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsContentStore::new(dir.path().join("files"), IngestMode::Copy);
        let err = store.describe("../etc/passwd", None).await.unwrap_err();
        assert!(matches!(err, CasError::InvalidPath(_)));
        assert!(store.describe("", None).await.is_err());
    }
}
