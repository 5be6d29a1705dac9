//! Safe Cache Module
//!
//! Thread-safe wrapper around a single store, counting lookups and hits.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::cache::{Stat, Store, Value};
use crate::error::Result;

// == Safe Cache ==
/// Guards a store behind one read/write lock.
///
/// LRU and LFU stores reorder entries on a hit, so their `get` takes the
/// exclusive lock. Stores that read without reordering (FIFO) are served
/// under the shared lock, so concurrent readers do not queue behind each
/// other. Eviction runs inline with `set`, under the exclusive lock.
///
/// The counters are atomics outside the lock. `n_hit` never runs ahead of
/// `n_get` in a snapshot.
pub struct SafeCache {
    store: RwLock<Option<Box<dyn Store>>>,
    /// Fixed by the store's policy, read once at construction
    reorders_on_read: bool,
    n_get: AtomicU64,
    n_hit: AtomicU64,
}

impl SafeCache {
    // == Constructor ==
    /// Wraps a concrete store.
    pub fn new<S: Store + 'static>(store: S) -> Self {
        Self::from_boxed(Box::new(store))
    }

    /// Wraps an already boxed store without boxing it again.
    pub fn from_boxed(store: Box<dyn Store>) -> Self {
        Self::with_store(Some(store))
    }

    /// An accessor with no backing store: every lookup misses and every
    /// write is dropped.
    pub fn uninitialized() -> Self {
        Self::with_store(None)
    }

    fn with_store(store: Option<Box<dyn Store>>) -> Self {
        Self {
            reorders_on_read: store.as_ref().is_some_and(|s| s.reorders_on_read()),
            store: RwLock::new(store),
            n_get: AtomicU64::new(0),
            n_hit: AtomicU64::new(0),
        }
    }

    // == Get ==
    /// Looks up `key`, counting the call and, on success, the hit.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.n_get.fetch_add(1, Ordering::SeqCst);

        let value = if self.reorders_on_read {
            self.store.write().as_mut()?.get(key)
        } else {
            self.store.read().as_ref()?.peek(key)
        }?;

        self.n_hit.fetch_add(1, Ordering::SeqCst);
        debug!(key, "cache hit");
        Some(value)
    }

    // == Set ==
    /// Stores `value` under `key`, evicting as the store's policy requires.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        match self.store.write().as_mut() {
            Some(store) => store.set(key, value.into()),
            None => {
                warn!(key = %key, "set on uninitialized cache ignored");
                Ok(())
            }
        }
    }

    // == Delete ==
    pub fn delete(&self, key: &str) {
        if let Some(store) = self.store.write().as_mut() {
            store.delete(key);
        }
    }

    // == Stat ==
    /// Returns a copy of the hit and get counters.
    pub fn stat(&self) -> Stat {
        // Hits are counted after gets, so loading hits first keeps n_hit <= n_get
        let n_hit = self.n_hit.load(Ordering::SeqCst);
        let n_get = self.n_get.load(Ordering::SeqCst);
        Stat { n_hit, n_get }
    }

    // == Length ==
    /// Number of entries in the backing store.
    pub fn len(&self) -> usize {
        self.store.read().as_ref().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Accounted bytes held by the backing store.
    pub fn used_bytes(&self) -> i64 {
        self.store.read().as_ref().map_or(0, |s| s.used_bytes())
    }
}
