//! Error types for identity-index operations.

use thiserror::Error;

/// Errors that can occur while building or querying the identity index.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The record source failed during the initial scan. The index stays
    /// unbuilt and the next lookup retries.
    #[error("identity scan failed: {0}")]
    Scan(String),
}

/// Result alias for identity-index operations.
pub type IdentityResult<T> = std::result::Result<T, IdentityError>;
