//! FIFO Store Module
//!
//! Evicts entries in insertion order.

use crate::cache::list::ListStore;
use crate::cache::{OnEvicted, SizePolicy, Store, Value};
use crate::error::Result;

// == FIFO Store ==
/// Insertion-ordered store.
///
/// Reads never reorder entries. Overwriting an existing key moves it to the
/// newest end, exactly as if it had been freshly inserted.
pub struct FifoStore {
    inner: ListStore,
}

impl FifoStore {
    // == Constructor ==
    /// Creates a FIFO store with the default 64-bit size accounting.
    ///
    /// # Arguments
    /// * `max_bytes` - Byte budget; zero or negative disables eviction
    /// * `on_evicted` - Called once for every entry removed from the store
    pub fn new(max_bytes: i64, on_evicted: Option<OnEvicted>) -> Self {
        Self::with_size_policy(max_bytes, on_evicted, SizePolicy::default())
    }

    pub fn with_size_policy(
        max_bytes: i64,
        on_evicted: Option<OnEvicted>,
        size_policy: SizePolicy,
    ) -> Self {
        Self {
            inner: ListStore::new(max_bytes, on_evicted, size_policy),
        }
    }
}

impl Store for FifoStore {
    fn set(&mut self, key: String, value: Value) -> Result<()> {
        self.inner.set(key, value)
    }

    fn get(&mut self, key: &str) -> Option<Value> {
        self.inner.get(key, false)
    }

    fn peek(&self, key: &str) -> Option<Value> {
        self.inner.peek(key)
    }

    fn reorders_on_read(&self) -> bool {
        false
    }

    fn delete(&mut self, key: &str) {
        self.inner.delete(key)
    }

    fn delete_oldest(&mut self) {
        self.inner.delete_oldest()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn used_bytes(&self) -> i64 {
        self.inner.used_bytes()
    }

    fn max_bytes(&self) -> i64 {
        self.inner.max_bytes()
    }
}
