use std::path::PathBuf;

/// Errors from content-store operations.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// The ingestion source is missing or is not a regular file.
    #[error("source is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    /// A relative content-store path escapes the root or is empty.
    #[error("invalid content-store path: {0}")]
    InvalidPath(String),

    /// I/O error from the underlying file system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for content-store operations.
pub type Result<T> = std::result::Result<T, CasError>;
