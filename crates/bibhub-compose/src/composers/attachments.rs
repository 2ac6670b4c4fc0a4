use async_trait::async_trait;
use bibhub_spoke::{write_json, AttachmentsHook};
use bibhub_types::{EntryId, HookKind, Workspace};

use crate::composer::HookComposer;
use crate::context::HookContext;
use crate::error::{ComposeError, ComposeResult};

/// Writes the attachment manifest to `hooks/attachments.json`.
///
/// The manifest is replaced wholesale; attachments are expected to be
/// content-addressed already.
pub struct AttachmentListComposer;

#[async_trait]
impl HookComposer for AttachmentListComposer {
    fn name(&self) -> &str {
        "attachments"
    }

    fn kind(&self) -> HookKind {
        HookKind::Attachments
    }

    fn can_compose(&self, context: &HookContext) -> bool {
        context.attachments.is_some()
    }

    async fn persist(
        &self,
        workspace: &Workspace,
        id: &EntryId,
        context: &HookContext,
    ) -> ComposeResult<()> {
        let attachments = context
            .attachments
            .clone()
            .ok_or_else(|| ComposeError::NotApplicable {
                composer: self.name().into(),
            })?;
        let hook = AttachmentsHook { attachments };
        write_json(&workspace.hook_path(id, self.kind()), &hook)
            .await
            .map_err(|e| ComposeError::persist(self.kind(), e))
    }
}
