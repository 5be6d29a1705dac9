//! Cache Module
//!
//! Provides byte-bounded in-memory stores with swappable eviction policies,
//! a thread-safe accessor and a cache-aside loading front end.

mod fifo;
mod lfu;
mod list;
mod loader;
mod loading;
mod lru;
mod safe;
mod size;
mod stats;
mod value;


use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// Re-export public types
pub use fifo::FifoStore;
pub use lfu::{LfuStore, ENTRY_OVERHEAD as LFU_ENTRY_OVERHEAD};
pub use loader::{LoadFn, Loader, NoLoader};
pub use loading::LoadingCache;
pub use lru::LruStore;
pub use safe::SafeCache;
pub use size::{SizePolicy, WordWidth};
pub use stats::Stat;
pub use value::{ByteLen, Value};

// == Eviction Callback ==
/// Called synchronously once for every entry removed from a store.
pub type OnEvicted = Box<dyn FnMut(&str, &Value) + Send + Sync>;

// == Store Trait ==
/// Shared contract of every eviction policy.
///
/// `set` enforces the byte budget before returning: when the accounted size
/// exceeds `max_bytes` (and `max_bytes > 0`), entries are evicted in policy
/// order until it fits or a single entry remains.
pub trait Store: Send + Sync {
    /// Inserts or overwrites `key`. Fails if the value cannot be sized or
    /// its size would overflow the byte accounting; the store is then left
    /// unchanged.
    fn set(&mut self, key: String, value: Value) -> Result<()>;

    /// Looks up `key`. Policies may reorder entries on a hit.
    fn get(&mut self, key: &str) -> Option<Value>;

    /// Looks up `key` without touching its eviction order or weight.
    fn peek(&self, key: &str) -> Option<Value>;

    /// Whether `get` changes eviction order. When false, `get` and `peek`
    /// are interchangeable.
    fn reorders_on_read(&self) -> bool {
        true
    }

    /// Removes `key` if present.
    fn delete(&mut self, key: &str);

    /// Removes the entry the policy values least. No-op when empty.
    fn delete_oldest(&mut self);

    /// Number of live entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the accounted sizes of all live entries.
    fn used_bytes(&self) -> i64;

    /// Byte budget; zero or negative means unbounded.
    fn max_bytes(&self) -> i64;
}

impl<S: Store + ?Sized> Store for Box<S> {
    fn set(&mut self, key: String, value: Value) -> Result<()> {
        (**self).set(key, value)
    }

    fn get(&mut self, key: &str) -> Option<Value> {
        (**self).get(key)
    }

    fn peek(&self, key: &str) -> Option<Value> {
        (**self).peek(key)
    }

    fn reorders_on_read(&self) -> bool {
        (**self).reorders_on_read()
    }

    fn delete(&mut self, key: &str) {
        (**self).delete(key)
    }

    fn delete_oldest(&mut self) {
        (**self).delete_oldest()
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn used_bytes(&self) -> i64 {
        (**self).used_bytes()
    }

    fn max_bytes(&self) -> i64 {
        (**self).max_bytes()
    }
}

/// Usage after replacing an entry of `old_size` bytes with `new_size` bytes.
///
/// Fails instead of wrapping when the total no longer fits in an `i64`.
pub(crate) fn replaced_usage(
    used_bytes: i64,
    old_size: i64,
    new_size: i64,
    key: &str,
) -> Result<i64> {
    used_bytes
        .checked_sub(old_size)
        .and_then(|rest| rest.checked_add(new_size))
        .ok_or_else(|| CacheError::SizeOverflow(key.to_string()))
}

/// True when a bounded store holds more than its budget.
pub(crate) fn over_budget(max_bytes: i64, used_bytes: i64) -> bool {
    max_bytes > 0 && used_bytes > max_bytes
}

// == Eviction Policy ==
/// Selects a store implementation at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Insertion order
    Fifo,
    /// Recency order
    #[default]
    Lru,
    /// Access frequency
    Lfu,
}

impl EvictionPolicy {
    /// Builds an empty store for this policy.
    pub fn build(
        self,
        max_bytes: i64,
        on_evicted: Option<OnEvicted>,
        size_policy: SizePolicy,
    ) -> Box<dyn Store> {
        match self {
            EvictionPolicy::Fifo => Box::new(FifoStore::with_size_policy(
                max_bytes,
                on_evicted,
                size_policy,
            )),
            EvictionPolicy::Lru => Box::new(LruStore::with_size_policy(
                max_bytes,
                on_evicted,
                size_policy,
            )),
            EvictionPolicy::Lfu => Box::new(LfuStore::with_size_policy(
                max_bytes,
                on_evicted,
                size_policy,
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Fifo => "fifo",
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(EvictionPolicy::Fifo),
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown eviction policy '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::{OnEvicted, Value};

    /// Returns a shared log of evicted keys and a callback that appends to it.
    pub fn eviction_log() -> (Arc<Mutex<Vec<String>>>, OnEvicted) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let on_evicted: OnEvicted =
            Box::new(move |key: &str, _value: &Value| sink.lock().push(key.to_string()));
        (log, on_evicted)
    }
}
