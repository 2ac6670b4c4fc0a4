//! Spoke handlers and hook payloads for the bibhub entry store.
//!
//! Every entry has one hub file and a set of hook files next to it. The
//! *primary* hook carries the type-specific payload and is owned by a
//! [`SpokeHandler`]; auxiliary hooks (notes, change log, attachment
//! manifest) are plain payload types written by the store or by composers.
//!
//! # Handlers
//!
//! | handler | entry types | hook file |
//! |---------|-------------|-----------|
//! | [`ArticleHandler`] | `publication` | `hooks/article.json` |
//! | [`DocumentHandler`] | `report`, fallback for anything else | `hooks/document.json` |
//! | [`LitSearchHandler`] | `search_run` | `hooks/litsearch.json` |
//!
//! [`HandlerRegistry`] picks a handler for writes by entry type and for
//! reads by the hooks a hub declares.

pub mod error;
pub mod handler;
pub mod handlers;
pub mod hooks;
pub mod io;
pub mod registry;

pub use error::{Result, SpokeError};
pub use handler::{
    resolve_attachments, AttachmentIngestor, ContentStoreIngestor, SpokeHandler,
};
pub use handlers::{ArticleHandler, DocumentHandler, LitSearchHandler};
pub use hooks::{
    ArticleHook, AttachmentsHook, ChangeLogHook, DocumentHook, FileAsset, LitSearchHook,
    NotesHook, PrimaryHook,
};
pub use io::{file_exists, read_json, remove_if_exists, write_json};
pub use registry::HandlerRegistry;
