use bibhub_types::HookKind;

/// Errors raised by individual composers.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// The context lacks the data this composer needs.
    #[error("composer '{composer}' cannot compose from this context")]
    NotApplicable { composer: String },

    /// Reading or writing a hook file failed.
    #[error("failed to persist {kind} hook: {source}")]
    Persist {
        kind: HookKind,
        #[source]
        source: bibhub_spoke::SpokeError,
    },
}

impl ComposeError {
    pub fn persist(kind: HookKind, source: bibhub_spoke::SpokeError) -> Self {
        Self::Persist { kind, source }
    }
}

/// Result alias for composer operations.
pub type ComposeResult<T> = std::result::Result<T, ComposeError>;
