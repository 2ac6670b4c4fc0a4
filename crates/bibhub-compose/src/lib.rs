//! Auxiliary hook composers for bibhub entries.
//!
//! The primary hook of an entry is owned by its spoke handler. Everything
//! else (citation data pulled from a lookup, the attachment manifest, the
//! change log) is written by a [`HookComposer`]. The [`HookOrchestrator`]
//! runs each composer whose data is present in a [`HookContext`] and
//! reports per-composer outcomes.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bibhub_compose::{HookContext, HookOrchestrator};
//! use bibhub_types::{ChangeLogEvent, EntryId, Workspace};
//!
//! # async fn run() {
//! let orchestrator = HookOrchestrator::with_default_composers(Workspace::new("/tmp/ws"));
//! let context = HookContext::new().with_event(ChangeLogEvent::new("screened"));
//! let report = orchestrator.process(&EntryId::new(), &context).await;
//! assert!(report.is_clean());
//! # }
//! ```

pub mod composer;
pub mod composers;
pub mod context;
pub mod error;
pub mod orchestrator;

// Re-exports for convenience.
pub use composer::HookComposer;
pub use composers::{AttachmentListComposer, ChangeLogComposer, CitationComposer};
pub use context::HookContext;
pub use error::{ComposeError, ComposeResult};
pub use orchestrator::{ComposeOutcome, ComposeReport, ComposerResult, HookOrchestrator};
