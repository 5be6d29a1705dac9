//! Loading Cache Module
//!
//! Cache-aside front end: consult the cache, fall back to a loader on a miss
//! and write the loaded value back.

use tracing::debug;

use crate::cache::{Loader, NoLoader, SafeCache, Stat, Store, Value};

// == Loading Cache ==
/// Combines a [`SafeCache`] with an optional [`Loader`].
///
/// The loader runs after the cache lock has been released, so a slow source
/// only blocks the calling thread. Two threads missing the same key at the
/// same time will both call the loader; the later write wins.
pub struct LoadingCache<L = NoLoader> {
    cache: SafeCache,
    loader: Option<L>,
}

impl LoadingCache<NoLoader> {
    /// A cache that only ever returns what was stored directly.
    pub fn without_loader<S: Store + 'static>(store: S) -> Self {
        Self {
            cache: SafeCache::new(store),
            loader: None,
        }
    }
}

impl<L: Loader> LoadingCache<L> {
    // == Constructor ==
    pub fn new<S: Store + 'static>(loader: Option<L>, store: S) -> Self {
        Self::with_cache(loader, SafeCache::new(store))
    }

    /// Puts a loader in front of an existing accessor.
    pub fn with_cache(loader: Option<L>, cache: SafeCache) -> Self {
        Self { cache, loader }
    }

    // == Get ==
    /// Returns the cached value, loading and caching it on a miss.
    ///
    /// A loader answer of `None` is passed on without being cached, so the
    /// next lookup for the same key asks the loader again. Loader errors are
    /// returned unchanged.
    pub fn get(&self, key: &str) -> Result<Option<Value>, L::Error> {
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value));
        }

        let Some(loader) = self.loader.as_ref() else {
            return Ok(None);
        };

        debug!(key, "cache miss, invoking loader");
        match loader.load(key)? {
            Some(value) => {
                self.cache.set(key, value.clone())?;
                Ok(Some(value))
            }
            None => {
                debug!(key, "loader has no value");
                Ok(None)
            }
        }
    }

    // == Stat ==
    pub fn stat(&self) -> Stat {
        self.cache.stat()
    }

    /// The underlying accessor, for direct writes and deletes.
    pub fn cache(&self) -> &SafeCache {
        &self.cache
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FifoStore, LoadFn, LruStore};
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type Loaded = Result<Option<Value>, CacheError>;

    fn counting_loader(
        calls: Arc<AtomicUsize>,
    ) -> LoadFn<impl Fn(&str) -> Loaded + Send + Sync> {
        LoadFn(move |key: &str| -> Loaded {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(key.strip_prefix("db:").map(Value::from))
        })
    }

    #[test]
    fn test_loading_hit_skips_loader() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache =
            LoadingCache::new(Some(counting_loader(calls.clone())), LruStore::new(0, None));
        cache.cache().set("db:a", "preloaded").unwrap();

        assert_eq!(cache.get("db:a").unwrap(), Some(Value::from("preloaded")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_loading_miss_loads_and_caches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache =
            LoadingCache::new(Some(counting_loader(calls.clone())), LruStore::new(0, None));

        assert_eq!(cache.get("db:a").unwrap(), Some(Value::from("a")));
        assert_eq!(cache.get("db:a").unwrap(), Some(Value::from("a")));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stat(), Stat { n_hit: 1, n_get: 2 });
    }

    #[test]
    fn test_loading_absent_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache =
            LoadingCache::new(Some(counting_loader(calls.clone())), FifoStore::new(0, None));

        assert_eq!(cache.get("x").unwrap(), None);
        assert_eq!(cache.get("x").unwrap(), None);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.cache().is_empty());
    }

    #[test]
    fn test_loading_with_existing_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let inner = SafeCache::new(FifoStore::new(0, None));
        inner.set("db:a", "seeded").unwrap();

        let cache = LoadingCache::with_cache(Some(counting_loader(calls.clone())), inner);
        assert_eq!(cache.get("db:a").unwrap(), Some(Value::from("seeded")));
        assert_eq!(cache.get("db:b").unwrap(), Some(Value::from("b")));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cache().len(), 2);
    }

    #[test]
    fn test_loading_without_loader() {
        let cache = LoadingCache::without_loader(FifoStore::new(0, None));

        assert_eq!(cache.get("a").unwrap(), None);
        cache.cache().set("a", 1_u8).unwrap();
        assert_eq!(cache.get("a").unwrap(), Some(Value::U8(1)));
    }

    #[test]
    fn test_loading_unsupported_value_surfaces_as_error() {
        let loader = LoadFn(|_: &str| -> Loaded { Ok(Some(Value::opaque(()))) });
        let cache = LoadingCache::new(Some(loader), LruStore::new(0, None));

        assert!(matches!(cache.get("k"), Err(CacheError::UnsupportedType(_))));
        assert!(cache.cache().is_empty());
    }
}
