//! LRU Store Module
//!
//! Evicts the least recently used entry.

use crate::cache::list::ListStore;
use crate::cache::{OnEvicted, SizePolicy, Store, Value};
use crate::error::Result;

// == LRU Store ==
/// Recency-ordered store.
///
/// Same layout as [`FifoStore`](super::FifoStore); the only difference is
/// that a successful `get` moves the entry to the most recent end.
pub struct LruStore {
    inner: ListStore,
}

impl LruStore {
    // == Constructor ==
    /// Creates an LRU store with the default 64-bit size accounting.
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

impl Store for LruStore {
    fn set(&mut self, key: String, value: Value) -> Result<()> {
        self.inner.set(key, value)
    }

    fn get(&mut self, key: &str) -> Option<Value> {
        self.inner.get(key, true)
    }

    fn peek(&self, key: &str) -> Option<Value> {
        self.inner.peek(key)
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
