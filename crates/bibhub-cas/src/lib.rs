//! Content-addressed file storage for bibhub.
//!
//! Primary files and attachments are moved (or copied) into a directory
//! keyed by the SHA-256 of their bytes, analogous to git's object store but
//! holding whole files rather than serialized objects.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`FsContentStore`] -- sharded directory layout on the local disk
//!
//! # Design Rules
//!
//! 1. The storage path is derived from the content hash, so identical bytes
//!    always resolve to one canonical file.
//! 2. Write-then-rename: bytes land in a temporary file first.
//! 3. Existing content is never rewritten; a second ingestion of the same
//!    bytes only returns the existing location.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod hasher;
pub mod traits;

pub use error::{CasError, Result};
pub use fs::{FsContentStore, IngestMode};
pub use hasher::{Hasher, Sha256Hasher};
pub use traits::ContentStore;
