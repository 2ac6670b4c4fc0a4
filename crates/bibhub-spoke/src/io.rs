//! JSON file helpers shared by hub, hook, and composer writers.
//!
//! Reads map "file absent" to `Ok(None)` and decoding failures to
//! [`SpokeError::Malformed`]. Writes go through a sibling temporary file
//! and a rename so readers never observe a half-written payload.

use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::warn;

use crate::error::{Result, SpokeError};

/// Read and decode a JSON file. `Ok(None)` if the file does not exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| SpokeError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Encode `value` as pretty JSON and replace `path` with it.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data =
        serde_json::to_vec_pretty(value).map_err(|e| SpokeError::Serialization(e.to_string()))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::now_v7().simple()));
    fs::write(&tmp, &data).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        if let Err(cleanup) = fs::remove_file(&tmp).await {
            warn!(error = %cleanup, path = %tmp.display(), "failed to remove temporary file");
        }
        return Err(e.into());
    }
    Ok(())
}

/// Delete `path`. Returns `true` if it existed.
pub async fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Returns `true` if `path` exists as a file.
pub async fn file_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/p.json");
        let value = Payload {
            name: "x".into(),
            count: 3,
        };
        write_json(&path, &value).await.unwrap();
        let back: Option<Payload> = read_json(&path).await.unwrap();
        assert_eq!(back, Some(value));
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let back: Option<Payload> = read_json(&dir.path().join("absent.json")).await.unwrap();
        assert!(back.is_none());
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"{not json").await.unwrap();
        let err = read_json::<Payload>(&path).await.unwrap_err();
        match err {
            SpokeError::Malformed { path: p, .. } => assert_eq!(p, path),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn no_temporary_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.json");
        write_json(&path, &serde_json::json!({"a": 1})).await.unwrap();
        write_json(&path, &serde_json::json!({"a": 2})).await.unwrap();

        let mut names = Vec::new();
        let mut rd = fs::read_dir(dir.path()).await.unwrap();
        while let Some(e) = rd.next_entry().await.unwrap() {
            names.push(e.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["p.json".to_string()]);
    }

    #[tokio::test]
    async fn failed_rename_cleans_up_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the final rename fail.
        let path = dir.path().join("p.json");
        fs::create_dir_all(path.join("inner")).await.unwrap();

        assert!(write_json(&path, &serde_json::json!({"a": 1})).await.is_err());

        let mut names = Vec::new();
        let mut rd = fs::read_dir(dir.path()).await.unwrap();
        while let Some(e) = rd.next_entry().await.unwrap() {
            names.push(e.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["p.json".to_string()]);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.json");
        assert!(!remove_if_exists(&path).await.unwrap());
        fs::write(&path, b"{}").await.unwrap();
        assert!(file_exists(&path).await);
        assert!(remove_if_exists(&path).await.unwrap());
        assert!(!file_exists(&path).await);
    }
}
