use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid entry id: {0}")]
    InvalidEntryId(String),

    #[error("unknown entry type: {0}")]
    UnknownEntryType(String),

    #[error("unknown hook kind: {0}")]
    UnknownHookKind(String),
}
