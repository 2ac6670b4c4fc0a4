/// Errors from search-index backends.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// Backend-specific failure (e.g. an on-disk index that cannot be opened).
    #[error("search backend error: {0}")]
    Backend(String),
}

/// Result alias for search-index operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;
