//! Policy Cache - A bounded in-process key/value cache
//!
//! Byte-budgeted stores with FIFO, LRU and LFU eviction, a thread-safe
//! accessor with hit statistics, and a cache-aside loading front end.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    EvictionPolicy, FifoStore, LfuStore, LoadFn, Loader, LoadingCache, LruStore, SafeCache, Stat,
    Store, Value,
};
pub use config::Config;
pub use error::{CacheError, Result};
