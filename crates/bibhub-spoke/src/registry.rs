use std::sync::Arc;

use bibhub_types::{EntryHub, EntryType, HookKind};

use crate::error::{Result, SpokeError};
use crate::handler::SpokeHandler;
use crate::handlers::{ArticleHandler, DocumentHandler, LitSearchHandler};

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

/// Dispatch table from entry type to spoke handler.
///
/// Writes dispatch on the entry's declared type. Reads dispatch on the
/// hub: the primary hook it was saved with, then the declared type when the
/// hub carries that handler's hook, then the first primary hook present on
/// the hub (hubs written before their type had a handler).
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn SpokeHandler>>,
}

impl HandlerRegistry {
    /// An empty registry. Lookups fail with [`SpokeError::NoHandler`] until
    /// a handler is registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the article, document, and litsearch handlers.
    pub fn with_default_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ArticleHandler));
        registry.register(Arc::new(DocumentHandler));
        registry.register(Arc::new(LitSearchHandler));
        registry
    }

    /// Append a handler. Earlier registrations win ties.
    pub fn register(&mut self, handler: Arc<dyn SpokeHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The handler that owns `kind`, if any.
    pub fn for_hook_kind(&self, kind: HookKind) -> Option<Arc<dyn SpokeHandler>> {
        self.handlers
            .iter()
            .find(|h| h.hook_kind() == kind)
            .cloned()
    }

    /// Handler for writing an entry of `entry_type`: exact match, then the
    /// document handler, then whatever was registered first.
    pub fn for_type(&self, entry_type: EntryType) -> Result<Arc<dyn SpokeHandler>> {
        self.handlers
            .iter()
            .find(|h| h.entry_types().contains(&entry_type))
            .cloned()
            .or_else(|| self.for_hook_kind(HookKind::Document))
            .or_else(|| self.handlers.first().cloned())
            .ok_or(SpokeError::NoHandler)
    }

    /// Handler for reading `hub`.
    ///
    /// The primary hook recorded on the hub wins. Hubs without one use the
    /// handler for their type when its hook is declared, then the first
    /// declared primary hook, then the first registered handler.
    pub fn for_hub(&self, hub: &EntryHub) -> Result<Arc<dyn SpokeHandler>> {
        if let Some(handler) = hub
            .primary
            .filter(|kind| hub.has_hook(*kind))
            .and_then(|kind| self.for_hook_kind(kind))
        {
            return Ok(handler);
        }
        if let Ok(handler) = self.for_type(hub.entry_type) {
            if hub.has_hook(handler.hook_kind()) {
                return Ok(handler);
            }
        }
        HookKind::PRIMARY
            .into_iter()
            .filter(|kind| hub.has_hook(*kind))
            .find_map(|kind| self.for_hook_kind(kind))
            .or_else(|| self.handlers.first().cloned())
            .ok_or(SpokeError::NoHandler)
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}
