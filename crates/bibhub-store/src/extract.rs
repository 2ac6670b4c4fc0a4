//! Best-effort plain-text extraction from primary files.
//!
//! Extraction only feeds the search index. Failures are reported to the
//! caller, which logs and carries on without text.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Extensions read directly as UTF-8 (lossy).
const PLAIN_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "csv", "tsv", "json", "xml", "html", "htm", "ris", "bib", "nbib",
];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("extraction task failed: {0}")]
    Task(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Pulls searchable text out of a file.
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// `Ok(None)` when the format is unsupported or the file is too large.
    ///
    /// Stored files carry no extension, so the format is taken from
    /// `file_name` (the name the file was ingested under) when given.
    async fn extract_text(
        &self,
        path: &Path,
        file_name: Option<&str>,
    ) -> Result<Option<String>, ExtractError>;
}

/// Extractor for plain-text formats and PDF, capped at `max_bytes`.
#[derive(Clone, Debug)]
pub struct FileTextExtractor {
    max_bytes: u64,
}

impl FileTextExtractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

#[async_trait]
impl ContentExtractor for FileTextExtractor {
    async fn extract_text(
        &self,
        path: &Path,
        file_name: Option<&str>,
    ) -> Result<Option<String>, ExtractError> {
        let ext = file_name
            .and_then(|name| extension(Path::new(name)))
            .or_else(|| extension(path));
        let Some(ext) = ext else {
            return Ok(None);
        };
        let is_pdf = ext == "pdf";
        if !is_pdf && !PLAIN_TEXT_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(None);
        }

        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_bytes {
            debug!(path = %path.display(), size, max = self.max_bytes, "skipping extraction of large file");
            return Ok(None);
        }
        let bytes = tokio::fs::read(path).await?;

        let text = if is_pdf {
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| ExtractError::Task(e.to_string()))?
                .map_err(|e| ExtractError::Pdf(e.to_string()))?
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };

        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.TXT");
        tokio::fs::write(&path, "  hello world \n").await.unwrap();
        let text = FileTextExtractor::new(1024)
            .extract_text(&path, None)
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn unsupported_and_oversized_yield_none() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("image.png");
        tokio::fs::write(&bin, [0u8, 1, 2]).await.unwrap();
        let big = dir.path().join("big.txt");
        tokio::fs::write(&big, "x".repeat(64)).await.unwrap();

        let extractor = FileTextExtractor::new(16);
        assert!(extractor.extract_text(&bin, None).await.unwrap().is_none());
        assert!(extractor.extract_text(&big, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn broken_pdf_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        tokio::fs::write(&path, b"not really a pdf").await.unwrap();
        let err = FileTextExtractor::new(1024).extract_text(&path, None).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn format_follows_the_ingested_name() {
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("9f86d081884c7d65");
        tokio::fs::write(&stored, "stored without extension").await.unwrap();

        let extractor = FileTextExtractor::new(1024);
        assert!(extractor.extract_text(&stored, None).await.unwrap().is_none());
        let text = extractor
            .extract_text(&stored, Some("minutes.md"))
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("stored without extension"));
    }
}
