use std::path::Path;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::Result;

const READ_CHUNK: usize = 64 * 1024;

/// Computes the content hash that keys the content store.
#[async_trait]
pub trait Hasher: Send + Sync {
    /// Lowercase hex SHA-256 of the file at `path`.
    async fn sha256(&self, path: &Path) -> Result<String>;
}

/// Streaming SHA-256 over the file contents.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    /// Hash an in-memory buffer.
    pub fn hash_bytes(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    /// Verify that `data` hashes to `expected`.
    pub fn verify(data: &[u8], expected: &str) -> bool {
        Self::hash_bytes(data).eq_ignore_ascii_case(expected)
    }
}

#[async_trait]
impl Hasher for Sha256Hasher {
    async fn sha256(&self, path: &Path) -> Result<String> {
        let mut file = tokio::fs::File::open(path).await?;
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = file.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}
