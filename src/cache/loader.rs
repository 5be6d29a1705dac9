//! Loader Module
//!
//! Source-of-truth lookups invoked by [`LoadingCache`](super::LoadingCache)
//! on a miss.

use std::sync::Arc;

use crate::cache::Value;
use crate::error::CacheError;

// == Loader Trait ==
/// Fetches the value for a key from outside the cache.
///
/// `Ok(None)` means the source has no value; it is never cached. Errors are
/// returned to the caller untouched, so the error type is the loader's own.
/// It must be able to absorb a [`CacheError`] raised while storing the
/// loaded value.
pub trait Loader: Send + Sync {
    type Error: From<CacheError>;

    fn load(&self, key: &str) -> Result<Option<Value>, Self::Error>;
}

impl<L: Loader + ?Sized> Loader for Arc<L> {
    type Error = L::Error;

    fn load(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        (**self).load(key)
    }
}

// == Function Loader ==
/// Adapts a closure into a [`Loader`].
///
/// # Example
/// ```
/// use policy_cache::cache::{LoadFn, LoadingCache, LruStore, Value};
/// use policy_cache::error::CacheError;
///
/// let loader = LoadFn(|key: &str| -> Result<Option<Value>, CacheError> {
///     Ok(Some(Value::from(key.len())))
/// });
/// let cache = LoadingCache::new(Some(loader), LruStore::new(0, None));
/// assert_eq!(cache.get("four").unwrap(), Some(Value::from(4_usize)));
/// ```
pub struct LoadFn<F>(pub F);

impl<F, E> Loader for LoadFn<F>
where
    F: Fn(&str) -> Result<Option<Value>, E> + Send + Sync,
    E: From<CacheError>,
{
    type Error = E;

    fn load(&self, key: &str) -> Result<Option<Value>, E> {
        (self.0)(key)
    }
}

// == No Loader ==
/// Placeholder loader type for caches without a source of truth.
///
/// It has no values, so a `LoadingCache<NoLoader>` can only ever hold
/// `None` for its loader.
#[derive(Debug, Clone, Copy)]
pub enum NoLoader {}

impl Loader for NoLoader {
    type Error = CacheError;

    fn load(&self, _key: &str) -> Result<Option<Value>, CacheError> {
        match *self {}
    }
}
