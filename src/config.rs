//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{
    EvictionPolicy, Loader, LoadingCache, OnEvicted, SafeCache, SizePolicy, Store, WordWidth,
};

/// Default byte budget: 64 MiB
pub const DEFAULT_MAX_BYTES: i64 = 64 * 1024 * 1024;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which entry to evict when the budget is exceeded
    pub policy: EvictionPolicy,
    /// Byte budget; zero or negative disables eviction
    pub max_bytes: i64,
    /// Word width used when sizing strings and default-width integers
    pub word_width: WordWidth,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_POLICY` - `fifo`, `lru` or `lfu` (default: lru)
    /// - `CACHE_MAX_BYTES` - Byte budget (default: 64 MiB)
    /// - `CACHE_WORD_WIDTH` - `32` or `64` (default: 64)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            policy: env::var("CACHE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.policy),
            max_bytes: env::var("CACHE_MAX_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_bytes),
            word_width: env::var("CACHE_WORD_WIDTH")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .and_then(|bits| WordWidth::try_from(bits).ok())
                .unwrap_or(defaults.word_width),
        }
    }

    pub fn size_policy(&self) -> SizePolicy {
        SizePolicy::new(self.word_width)
    }

    /// Builds an empty store for the configured policy and budget.
    pub fn build_store(&self, on_evicted: Option<OnEvicted>) -> Box<dyn Store> {
        info!(
            policy = %self.policy,
            max_bytes = self.max_bytes,
            word_width = u8::from(self.word_width),
            "building cache store"
        );
        self.policy.build(self.max_bytes, on_evicted, self.size_policy())
    }

    /// Builds a loading cache over a freshly configured store.
    pub fn build_cache<L: Loader>(&self, loader: Option<L>) -> LoadingCache<L> {
        LoadingCache::with_cache(loader, SafeCache::from_boxed(self.build_store(None)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: EvictionPolicy::Lru,
            max_bytes: DEFAULT_MAX_BYTES,
            word_width: WordWidth::Bits64,
        }
    }
}
