use std::path::PathBuf;

use bibhub_types::HookKind;

/// Errors from hook construction, persistence, and mapping.
#[derive(Debug, thiserror::Error)]
pub enum SpokeError {
    /// A hub or hook file exists but cannot be decoded.
    #[error("malformed payload at {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    /// A payload could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A handler was given a hook of a kind it does not own.
    #[error("handler for {expected} hooks received a {found} hook")]
    HookMismatch { expected: HookKind, found: HookKind },

    /// No handler is registered at all.
    #[error("no spoke handler registered")]
    NoHandler,

    /// Content-store failure while ingesting an attachment.
    #[error("content store error: {0}")]
    Cas(#[from] bibhub_cas::CasError),

    /// I/O error reading or writing hook files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for spoke operations.
pub type Result<T> = std::result::Result<T, SpokeError>;
