use std::path::{Path, PathBuf};

use crate::hub::HookKind;
use crate::id::EntryId;

/// Default name of the directory holding one subdirectory per entry.
pub const DEFAULT_ENTRIES_DIR: &str = "entries";
/// Default name of the content-store root.
pub const DEFAULT_CAS_DIR: &str = "files";
/// File name of the hub inside an entry directory.
pub const HUB_FILE: &str = "hub.json";
/// Name of the hooks subdirectory inside an entry directory.
pub const HOOKS_DIR: &str = "hooks";

/// Path layout of a workspace directory.
///
/// ```text
/// <root>/
///   entries/<id>/hub.json
///   entries/<id>/hooks/<kind>.json
///   files/<hh>/<sha256>
/// ```
///
/// Pure path arithmetic; nothing here touches the file system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    entries_dir: String,
    cas_dir: String,
}

impl Workspace {
    /// A workspace using the default directory names.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_layout(root, DEFAULT_ENTRIES_DIR, DEFAULT_CAS_DIR)
    }

    pub fn with_layout(
        root: impl Into<PathBuf>,
        entries_dir: impl Into<String>,
        cas_dir: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            entries_dir: entries_dir.into(),
            cas_dir: cas_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries_dir(&self) -> PathBuf {
        self.root.join(&self.entries_dir)
    }

    pub fn entry_dir(&self, id: &EntryId) -> PathBuf {
        self.entries_dir().join(id.to_string())
    }

    pub fn hub_path(&self, id: &EntryId) -> PathBuf {
        self.entry_dir(id).join(HUB_FILE)
    }

    pub fn hooks_dir(&self, id: &EntryId) -> PathBuf {
        self.entry_dir(id).join(HOOKS_DIR)
    }

    pub fn hook_path(&self, id: &EntryId, kind: HookKind) -> PathBuf {
        self.hooks_dir(id).join(kind.file_name())
    }

    pub fn cas_root(&self) -> PathBuf {
        self.root.join(&self.cas_dir)
    }

    /// Absolute location of a content-store relative path.
    pub fn resolve_cas(&self, relative: &str) -> PathBuf {
        let mut path = self.cas_root();
        for part in relative.split('/').filter(|p| !p.is_empty()) {
            path.push(part);
        }
        path
    }
}
