//! Keyed locks serialising read-modify-write of one entity.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use conceptdb_core::errors::{ConceptDbError, ConceptDbResult};

/// One mutex per entity id, created on first use and dropped once no caller
/// holds or waits on it.
#[derive(Debug, Default)]
pub struct EntityLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `key`.
    pub fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key.to_string()).or_default().value().clone()
    }

    /// Run `f` while holding the lock for `key`.
    pub fn with_lock<R>(
        &self,
        key: &str,
        f: impl FnOnce() -> ConceptDbResult<R>,
    ) -> ConceptDbResult<R> {
        let handle = self.handle(key);
        let result = match handle.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(ConceptDbError::Concurrency(format!("lock for {key} is poisoned"))),
        };
        drop(handle);
        // Only the map's own reference left: nobody holds or awaits the lock.
        self.locks.remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }

    /// Number of ids with a live mutex.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
