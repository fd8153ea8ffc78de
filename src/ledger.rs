//! ledger.rs — in-memory record of project ids already sent to a subscriber.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Grows monotonically for the lifetime of the process; ids are never removed.
/// Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct DedupLedger {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().contains(id)
    }

    /// Atomic check-and-insert. Returns `true` only for the caller that inserted
    /// the id, so at most one caller may notify for it.
    pub fn insert_if_absent(&self, id: &str) -> bool {
        let mut set = self.inner.lock();
        if set.contains(id) {
            return false;
        }
        set.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
