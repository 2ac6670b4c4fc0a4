use async_trait::async_trait;
use bibhub_types::{EntryId, HookKind, Workspace};

use crate::context::HookContext;
use crate::error::ComposeResult;

/// A single-purpose writer for one auxiliary hook kind.
///
/// Composers are independent: each reads and writes only its own hook file,
/// and must be idempotent so a re-run after a partial failure converges.
#[async_trait]
pub trait HookComposer: Send + Sync {
    /// Human-readable name (e.g. "citation").
    fn name(&self) -> &str;

    /// The hook kind this composer writes.
    fn kind(&self) -> HookKind;

    /// Returns `true` if `context` carries data for this composer.
    fn can_compose(&self, context: &HookContext) -> bool;

    /// Write the hook for `id`.
    async fn persist(
        &self,
        workspace: &Workspace,
        id: &EntryId,
        context: &HookContext,
    ) -> ComposeResult<()>;
}
