//! Integration Tests for the public cache API
//!
//! Exercises stores, the thread-safe accessor and the loading cache the way
//! an embedding application would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use anyhow::anyhow;
use parking_lot::Mutex;
use policy_cache::cache::{ByteLen, OnEvicted};
use policy_cache::{
    CacheError, Config, EvictionPolicy, FifoStore, LfuStore, LoadFn, LoadingCache, LruStore,
    SafeCache, Stat, Store, Value,
};

// == Helper Functions ==

fn recording() -> (Arc<Mutex<Vec<String>>>, OnEvicted) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let on_evicted: OnEvicted =
        Box::new(move |key: &str, _value: &Value| sink.lock().push(key.to_string()));
    (log, on_evicted)
}

fn db() -> HashMap<String, String> {
    (1..=5)
        .map(|i| (format!("key{}", i), format!("value{}", i)))
        .collect()
}

// == Eviction Order ==

#[test]
fn test_fifo_ignores_reads_when_evicting() {
    let (log, on_evicted) = recording();
    let mut store = FifoStore::new(16, Some(on_evicted));

    store.set("k1".into(), Value::I64(1)).unwrap();
    store.set("k2".into(), Value::I64(2)).unwrap();
    store.get("k1");
    store.get("k2");
    store.set("k3".into(), Value::I64(3)).unwrap();

    assert_eq!(*log.lock(), vec!["k1"]);
}

#[test]
fn test_lru_read_saves_entry() {
    let (log, on_evicted) = recording();
    let mut store = LruStore::new(16, Some(on_evicted));

    store.set("k1".into(), Value::I64(1)).unwrap();
    store.set("k2".into(), Value::I64(2)).unwrap();
    store.get("k1");
    store.set("k3".into(), Value::I64(3)).unwrap();

    assert_eq!(*log.lock(), vec!["k2"]);
}

#[test]
fn test_lfu_evicts_k1_then_k3() {
    let (log, on_evicted) = recording();
    let mut store = LfuStore::new(32, Some(on_evicted));

    for (i, key) in ["k1", "k2", "k3", "k4"].into_iter().enumerate() {
        store.set(key.into(), Value::from(i as isize + 1)).unwrap();
    }

    assert_eq!(*log.lock(), vec!["k1", "k3"]);
    assert_eq!(store.len(), 2);
}

#[test]
fn test_custom_sized_values_count_against_budget() {
    struct Page(usize);

    impl ByteLen for Page {
        fn byte_len(&self) -> i64 {
            self.0 as i64
        }
    }

    let cache = SafeCache::new(LruStore::new(4096, None));
    for i in 0..10 {
        cache.set(format!("page{}", i), Value::custom(Page(1024))).unwrap();
    }

    assert_eq!(cache.len(), 4);
    assert_eq!(cache.used_bytes(), 4096);
    assert!(cache.get("page9").is_some());
    assert!(cache.get("page5").is_none());
}

// == Accessor Statistics ==

#[test]
fn test_concurrent_stat_accounting() {
    let source = db();
    let loader = LoadFn(|key: &str| -> Result<Option<Value>, CacheError> {
        Ok(source.get(key).map(|v| Value::from(v.as_str())))
    });
    let cache = LoadingCache::new(Some(loader), LruStore::new(0, None));

    thread::scope(|s| {
        for (key, value) in &source {
            let cache = &cache;
            s.spawn(move || {
                // Same key twice: first a miss, then a hit
                assert_eq!(cache.get(key).unwrap(), Some(Value::from(value.as_str())));
                assert_eq!(cache.get(key).unwrap(), Some(Value::from(value.as_str())));
            });
        }
    });

    assert_eq!(cache.get("unknown").unwrap(), None);
    assert_eq!(cache.get("unknown").unwrap(), None);

    assert_eq!(cache.stat(), Stat { n_hit: 5, n_get: 12 });
}

#[test]
fn test_stat_is_a_snapshot() {
    let cache = SafeCache::new(FifoStore::new(0, None));
    cache.set("a", 1_u8).unwrap();
    cache.get("a");

    let before = cache.stat();
    cache.get("a");
    cache.get("b");

    assert_eq!(before, Stat { n_hit: 1, n_get: 1 });
    assert_eq!(cache.stat(), Stat { n_hit: 2, n_get: 3 });
}

// == Loading Cache ==

#[test]
fn test_absent_results_are_reloaded() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let loader = LoadFn(move |_key: &str| -> Result<Option<Value>, CacheError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    });
    let cache = LoadingCache::new(Some(loader), FifoStore::new(0, None));

    assert_eq!(cache.get("x").unwrap(), None);
    assert_eq!(cache.get("x").unwrap(), None);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_loader_errors_propagate_unchanged() {
    let loader = LoadFn(|key: &str| -> anyhow::Result<Option<Value>> {
        Err(anyhow!("backend unavailable for {}", key))
    });
    let cache = LoadingCache::new(Some(loader), LruStore::new(0, None));

    let err = cache.get("user:1").unwrap_err();
    assert_eq!(err.to_string(), "backend unavailable for user:1");
    assert!(cache.cache().is_empty());
}

#[test]
fn test_store_errors_convert_into_loader_error() {
    let loader = LoadFn(|_: &str| -> anyhow::Result<Option<Value>> {
        Ok(Some(Value::opaque(std::time::Instant::now())))
    });
    let cache = LoadingCache::new(Some(loader), LruStore::new(0, None));

    let err = cache.get("k").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CacheError>(),
        Some(CacheError::UnsupportedType(_))
    ));
}

#[test]
fn test_loaded_values_are_subject_to_eviction() {
    let (log, on_evicted) = recording();
    let loader = LoadFn(|key: &str| -> Result<Option<Value>, CacheError> {
        Ok(Some(Value::from(key.len() as i64)))
    });
    let cache = LoadingCache::new(Some(loader), FifoStore::new(16, Some(on_evicted)));

    cache.get("a").unwrap();
    cache.get("bb").unwrap();
    cache.get("ccc").unwrap();

    assert_eq!(*log.lock(), vec!["a"]);
    assert_eq!(cache.cache().len(), 2);
}

#[test]
fn test_shared_loader_across_caches() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let loader = Arc::new(LoadFn(move |key: &str| -> Result<Option<Value>, CacheError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Value::from(key)))
    }));

    let fifo = LoadingCache::new(Some(Arc::clone(&loader)), FifoStore::new(0, None));
    let lfu = LoadingCache::new(Some(loader), LfuStore::new(0, None));

    fifo.get("a").unwrap();
    lfu.get("a").unwrap();
    fifo.get("a").unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// == Configuration ==

#[test]
fn test_config_builds_working_cache() {
    let config = Config {
        policy: EvictionPolicy::Lfu,
        max_bytes: 32,
        ..Config::default()
    };
    let loader = LoadFn(|key: &str| -> Result<Option<Value>, CacheError> {
        Ok(key.parse::<i64>().ok().map(Value::I64))
    });
    let cache = config.build_cache(Some(loader));

    assert_eq!(cache.get("7").unwrap(), Some(Value::I64(7)));
    assert_eq!(cache.get("7").unwrap(), Some(Value::I64(7)));
    assert_eq!(cache.get("seven").unwrap(), None);
    assert_eq!(cache.stat(), Stat { n_hit: 1, n_get: 3 });
}

#[test]
fn test_boxed_store_works_through_trait_object() {
    let policies = [EvictionPolicy::Fifo, EvictionPolicy::Lru, EvictionPolicy::Lfu];
    let mut stores: Vec<Box<dyn Store>> = policies
        .into_iter()
        .map(|policy| {
            Config {
                policy,
                max_bytes: 0,
                ..Config::default()
            }
            .build_store(None)
        })
        .collect();

    for store in &mut stores {
        store.set("k".into(), Value::from("v")).unwrap();
        assert_eq!(store.get("k"), Some(Value::from("v")));
        store.delete_oldest();
        assert!(store.is_empty());
    }
}
