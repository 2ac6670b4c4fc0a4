use std::time::{Duration, Instant};

use bibhub_types::{EntryId, HookKind, Workspace};
use tracing::{debug, warn};

use crate::composer::HookComposer;
use crate::composers::{AttachmentListComposer, ChangeLogComposer, CitationComposer};
use crate::context::HookContext;

// ---------------------------------------------------------------------------
// ComposeReport
// ---------------------------------------------------------------------------

/// What happened to one composer during a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposeOutcome {
    /// The hook file was written.
    Persisted,
    /// The context carried nothing for this composer.
    Skipped,
    /// The composer applied but failed; later composers still ran.
    Failed { reason: String },
}

/// Result of a single composer.
#[derive(Clone, Debug)]
pub struct ComposerResult {
    pub composer: String,
    pub kind: HookKind,
    pub outcome: ComposeOutcome,
    pub elapsed: Duration,
}

/// The outcome of running a context through every composer.
#[derive(Clone, Debug, Default)]
pub struct ComposeReport {
    /// Per-composer results in pipeline order.
    pub results: Vec<ComposerResult>,
    pub elapsed: Duration,
}

impl ComposeReport {
    /// Hook kinds that were written.
    pub fn persisted(&self) -> Vec<HookKind> {
        self.kinds_where(|o| matches!(o, ComposeOutcome::Persisted))
    }

    /// Hook kinds whose composer did not apply.
    pub fn skipped(&self) -> Vec<HookKind> {
        self.kinds_where(|o| matches!(o, ComposeOutcome::Skipped))
    }

    /// Failed composers with their reasons.
    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.results
            .iter()
            .filter_map(|r| match &r.outcome {
                ComposeOutcome::Failed { reason } => Some((r.composer.as_str(), reason.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Returns `true` if no composer failed.
    pub fn is_clean(&self) -> bool {
        self.failed().is_empty()
    }

    fn kinds_where(&self, pred: impl Fn(&ComposeOutcome) -> bool) -> Vec<HookKind> {
        self.results
            .iter()
            .filter(|r| pred(&r.outcome))
            .map(|r| r.kind)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// HookOrchestrator
// ---------------------------------------------------------------------------

/// Runs an ordered list of composers against a context.
///
/// Unlike a fail-fast pipeline, a failing composer is recorded and the
/// rest still run. There is no shared transaction across hook files.
pub struct HookOrchestrator {
    workspace: Workspace,
    composers: Vec<Box<dyn HookComposer>>,
}

impl HookOrchestrator {
    /// An orchestrator with no composers.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            composers: Vec::new(),
        }
    }

    /// Citation -> attachment list -> change log.
    pub fn with_default_composers(workspace: Workspace) -> Self {
        let mut orchestrator = Self::new(workspace);
        orchestrator.add_composer(Box::new(CitationComposer));
        orchestrator.add_composer(Box::new(AttachmentListComposer));
        orchestrator.add_composer(Box::new(ChangeLogComposer));
        orchestrator
    }

    /// Append a composer to the end of the pipeline.
    pub fn add_composer(&mut self, composer: Box<dyn HookComposer>) {
        self.composers.push(composer);
    }

    pub fn composer_count(&self) -> usize {
        self.composers.len()
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run every applicable composer for `id`.
    pub async fn process(&self, id: &EntryId, context: &HookContext) -> ComposeReport {
        let start = Instant::now();
        let mut results = Vec::with_capacity(self.composers.len());

        for composer in &self.composers {
            let composer_start = Instant::now();
            let outcome = if !composer.can_compose(context) {
                ComposeOutcome::Skipped
            } else {
                match composer.persist(&self.workspace, id, context).await {
                    Ok(()) => {
                        debug!(%id, composer = composer.name(), kind = %composer.kind(), "hook composed");
                        ComposeOutcome::Persisted
                    }
                    Err(e) => {
                        warn!(%id, composer = composer.name(), error = %e, "composer failed");
                        ComposeOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            };
            results.push(ComposerResult {
                composer: composer.name().to_string(),
                kind: composer.kind(),
                outcome,
                elapsed: composer_start.elapsed(),
            });
        }

        ComposeReport {
            results,
            elapsed: start.elapsed(),
        }
    }
}
