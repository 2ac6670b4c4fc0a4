use std::path::PathBuf;

use bibhub_types::EntryId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("invalid config at {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("content store error: {0}")]
    Cas(#[from] bibhub_cas::CasError),

    #[error("hook error: {0}")]
    Spoke(#[from] bibhub_spoke::SpokeError),

    #[error("search index error: {0}")]
    Search(#[from] bibhub_search::SearchError),

    #[error("identity index error: {0}")]
    Identity(#[from] bibhub_identity::IdentityError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
