use bibhub_spoke::ArticleHook;
use bibhub_types::{Attachment, ChangeLogEvent};

/// Data handed to the composer pipeline. Each composer inspects only the
/// part it cares about; everything is optional.
#[derive(Clone, Debug, Default)]
pub struct HookContext {
    /// Bibliographic citation data (e.g. from an external lookup).
    pub citation: Option<ArticleHook>,
    /// Full attachment manifest. `Some(vec![])` writes an empty manifest.
    pub attachments: Option<Vec<Attachment>>,
    /// Change-log events to append.
    pub events: Vec<ChangeLogEvent>,
    /// Stamped onto events that carry no actor.
    pub actor: Option<String>,
}

impl HookContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_citation(mut self, citation: ArticleHook) -> Self {
        self.citation = Some(citation);
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = Some(attachments);
        self
    }

    pub fn with_event(mut self, event: ChangeLogEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = ChangeLogEvent>) -> Self {
        self.events.extend(events);
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Returns `true` if no composer could apply.
    pub fn is_empty(&self) -> bool {
        self.citation.is_none() && self.attachments.is_none() && self.events.is_empty()
    }
}
