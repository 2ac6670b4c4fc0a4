//! Foundation types for bibhub.
//!
//! bibhub stores bibliographic and document records as a hub-and-spoke set
//! of JSON files: one hub per entry plus one hook file per payload kind.
//! Every other bibhub crate depends on `bibhub-types`.
//!
//! # Key Types
//!
//! - [`EntryId`]: time-ordered entry identifier (UUID v7)
//! - [`Entry`]: the in-memory record callers hand to the store
//! - [`EntryHub`]: the durable envelope that marks an entry as existing
//! - [`HookKind`]: the closed set of hook payload kinds
//! - [`CasResult`]: outcome of ingesting a file into the content store
//! - [`IndexRecord`] / [`SearchFilter`]: search-index projection and query
//! - [`Workspace`]: on-disk path layout

pub mod cas;
pub mod entry;
pub mod error;
pub mod hub;
pub mod id;
pub mod index;
pub mod workspace;

pub use cas::CasResult;
pub use entry::{Attachment, ChangeLogEvent, Entry, EntryType, SearchRunInfo};
pub use error::TypeError;
pub use hub::{CreationMethod, EntryHub, HookKind, Origin, Purpose};
pub use id::EntryId;
pub use index::{IndexRecord, SearchFilter};
pub use workspace::Workspace;
