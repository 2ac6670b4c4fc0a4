use async_trait::async_trait;
use bibhub_spoke::{read_json, write_json, ChangeLogHook};
use bibhub_types::{EntryId, HookKind, Workspace};
use tracing::debug;

use crate::composer::HookComposer;
use crate::context::HookContext;
use crate::error::{ComposeError, ComposeResult};

/// Appends queued events to `hooks/changelog.json`.
///
/// Events already present (same id) are skipped, so replaying a context
/// leaves the log unchanged.
pub struct ChangeLogComposer;

#[async_trait]
impl HookComposer for ChangeLogComposer {
    fn name(&self) -> &str {
        "changelog"
    }

    fn kind(&self) -> HookKind {
        HookKind::ChangeLog
    }

    fn can_compose(&self, context: &HookContext) -> bool {
        !context.events.is_empty()
    }

    async fn persist(
        &self,
        workspace: &Workspace,
        id: &EntryId,
        context: &HookContext,
    ) -> ComposeResult<()> {
        let path = workspace.hook_path(id, self.kind());
        let mut log: ChangeLogHook = read_json(&path)
            .await
            .map_err(|e| ComposeError::persist(self.kind(), e))?
            .unwrap_or_default();

        let events: Vec<_> = context
            .events
            .iter()
            .cloned()
            .map(|mut event| {
                if event.actor.is_none() {
                    event.actor = context.actor.clone();
                }
                event
            })
            .collect();
        let added = log.append(&events);
        if added == 0 {
            return Ok(());
        }

        write_json(&path, &log)
            .await
            .map_err(|e| ComposeError::persist(self.kind(), e))?;
        debug!(%id, added, total = log.events.len(), "appended change-log events");
        Ok(())
    }
}
