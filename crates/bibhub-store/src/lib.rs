//! Hub-and-spoke entry store for bibhub.
//!
//! [`EntryStore`] is the main entry point for applications. It persists
//! each [`Entry`](bibhub_types::Entry) as
//!
//! ```text
//! <root>/entries/<id>/hub.json            identity, timestamps, hook map
//! <root>/entries/<id>/hooks/<kind>.json   primary hook + auxiliary hooks
//! <root>/files/<hh>/<sha256>               content-addressed files
//! ```
//!
//! and keeps a search index and a DOI/PMID identity index up to date. The
//! files are the source of truth; both indexes can be rebuilt with
//! [`EntryStore::reindex`].

pub mod config;
pub mod error;
pub mod extract;
pub mod locks;
pub mod store;

pub use config::{StoreConfig, CONFIG_FILE};
pub use error::{StoreError, StoreResult};
pub use extract::{ContentExtractor, ExtractError, FileTextExtractor};
pub use locks::EntryLocks;
pub use store::{EntryStore, EntryStoreBuilder, ReindexReport};

// Re-export key types
pub use bibhub_compose::{ComposeReport, HookContext};
pub use bibhub_types::{
    Attachment, ChangeLogEvent, Entry, EntryHub, EntryId, EntryType, HookKind, SearchFilter,
    SearchRunInfo, Workspace,
};
