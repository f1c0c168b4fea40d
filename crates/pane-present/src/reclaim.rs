// SPDX-License-Identifier: CEPL-1.0
//! Deferred reclamation of GPU objects that outlive their presenter.
//!
//! A presenter torn down while GPU work may still signal or wait on its
//! semaphores or read its swapchain images hands those objects over to a
//! [`DeferredReclaimer`] under its
//! [`PresenterId`]. The completion callback of that work later calls
//! [`DeferredReclaimer::reclaim`] with the same id, which drops the entry and
//! with it the objects.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::{debug, warn};

/// Identity of one presenter for the lifetime of the process. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PresenterId(u64);

impl PresenterId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        PresenterId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PresenterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "presenter#{}", self.0)
    }
}

type Parked = Vec<Box<dyn Any + Send>>;

/// Shared handle to a reclamation table. Clones refer to the same table.
#[derive(Clone, Default)]
pub struct DeferredReclaimer {
    table: Arc<Mutex<HashMap<PresenterId, Parked>>>,
}

impl DeferredReclaimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide table used by presenters unless told otherwise.
    pub fn global() -> DeferredReclaimer {
        static GLOBAL: OnceLock<DeferredReclaimer> = OnceLock::new();
        GLOBAL.get_or_init(DeferredReclaimer::new).clone()
    }

    /// Hold `objects` until `reclaim(id)` runs. They are dropped in order.
    ///
    /// A second park for the same id means the first reclamation never fired;
    /// the new objects are appended to the existing entry.
    pub fn park(&self, id: PresenterId, objects: Parked) {
        let count = objects.len();
        let mut table = self.lock();
        match table.get_mut(&id) {
            Some(entry) => {
                warn!("{id}: presenter might not have been stopped properly");
                debug!("{id}: {} objects already parked, appending {}", entry.len(), count);
                entry.extend(objects);
            }
            None => {
                debug!("{id}: parking {} objects", count);
                table.insert(id, objects);
            }
        }
    }

    /// Release everything parked under `id`. Unknown ids are ignored.
    pub fn reclaim(&self, id: PresenterId) {
        // Drop the objects after the lock is released.
        let released = self.lock().remove(&id);
        if let Some(entry) = released {
            debug!("{id}: reclaiming {} objects", entry.len());
        }
    }

    pub fn contains(&self, id: PresenterId) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn parked_len(&self, id: PresenterId) -> Option<usize> {
        self.lock().get(&id).map(Vec::len)
    }

    /// Number of ids with parked objects.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PresenterId, Parked>> {
        // A panic while holding the lock leaves the map itself consistent.
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for DeferredReclaimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredReclaimer")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "reclaim_tests.rs"]
mod tests;
