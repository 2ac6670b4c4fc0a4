use std::path::{Path, PathBuf};

use bibhub_cas::IngestMode;
use bibhub_types::workspace::{DEFAULT_CAS_DIR, DEFAULT_ENTRIES_DIR};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Name of the config file at the workspace root.
pub const CONFIG_FILE: &str = "bibhub.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding one sub-directory per entry.
    pub entries_dir: String,
    /// Content-store root.
    pub cas_dir: String,
    pub ingest_mode: IngestMode,
    /// Extract plain text from primary files for the search index.
    pub extract_text: bool,
    /// Files larger than this are not extracted.
    pub max_extract_bytes: u64,
    /// Recorded as `created_by` / `updated_by`.
    pub actor: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            entries_dir: DEFAULT_ENTRIES_DIR.into(),
            cas_dir: DEFAULT_CAS_DIR.into(),
            ingest_mode: IngestMode::Move,
            extract_text: true,
            max_extract_bytes: 16 * 1024 * 1024,
            actor: "local".into(),
        }
    }
}

impl StoreConfig {
    /// Read a TOML config. A missing file yields the defaults.
    pub async fn load(path: &Path) -> StoreResult<Self> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text).map_err(|e| StoreError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load `bibhub.toml` from a workspace root.
    pub async fn load_from_workspace(root: &Path) -> StoreResult<Self> {
        Self::load(&Self::path_in(root)).await
    }

    pub fn path_in(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE)
    }

    pub async fn write(&self, path: &Path) -> StoreResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| StoreError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(path, text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.entries_dir, "entries");
        assert_eq!(c.cas_dir, "files");
        assert_eq!(c.ingest_mode, IngestMode::Move);
        assert!(c.extract_text);
        assert_eq!(c.max_extract_bytes, 16 * 1024 * 1024);
        assert_eq!(c.actor, "local");
    }

    #[tokio::test]
    async fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let c = StoreConfig::load_from_workspace(dir.path()).await.unwrap();
        assert_eq!(c, StoreConfig::default());
    }

    #[tokio::test]
    async fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = StoreConfig::path_in(dir.path());
        tokio::fs::write(&path, "ingest_mode = \"copy\"\nactor = \"alice\"\n")
            .await
            .unwrap();
        let c = StoreConfig::load(&path).await.unwrap();
        assert_eq!(c.ingest_mode, IngestMode::Copy);
        assert_eq!(c.actor, "alice");
        assert_eq!(c.cas_dir, "files");
    }

    #[tokio::test]
    async fn write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let c = StoreConfig {
            extract_text: false,
            ..Default::default()
        };
        c.write(&path).await.unwrap();
        assert_eq!(StoreConfig::load(&path).await.unwrap(), c);
    }

    #[tokio::test]
    async fn bad_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "extract_text = \"maybe\"").await.unwrap();
        assert!(matches!(
            StoreConfig::load(&path).await,
            Err(StoreError::Config { .. })
        ));
    }
}
