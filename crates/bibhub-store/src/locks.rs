use std::sync::Arc;

use bibhub_types::EntryId;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-entry advisory locks serializing writes to the same id within one
/// process. Different ids never contend.
#[derive(Debug, Default)]
pub struct EntryLocks {
    locks: DashMap<EntryId, Arc<Mutex<()>>>,
}

impl EntryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`. Released when the guard drops.
    pub async fn acquire(&self, id: EntryId) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drop locks nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
