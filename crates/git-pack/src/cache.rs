//! Bounded LRU cache of resolved packed objects.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use git_object::RawObject;
use lru::LruCache;

/// Cache key: `(pack file index, entry offset)`.
pub type CacheKey = (usize, u64);

/// LRU cache of fully resolved objects, shared between threads.
///
/// Values are `Arc`s so a hit is a refcount bump, not a copy of the body.
pub struct ObjectCache {
    cache: Mutex<LruCache<CacheKey, Arc<RawObject>>>,
}

impl ObjectCache {
    /// Create with the given capacity (number of objects, at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, Arc<RawObject>>> {
        // Entries are only ever whole values, so a poisoned lock is still consistent.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a cached object (promotes it to most-recently-used).
    pub fn get(&self, key: &CacheKey) -> Option<Arc<RawObject>> {
        self.lock().get(key).cloned()
    }

    /// Insert an object, evicting the least recently used entry when full.
    pub fn insert(&self, key: CacheKey, obj: Arc<RawObject>) {
        self.lock().put(key, obj);
    }

    /// Current number of cached objects.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// Clear all cached objects.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl std::fmt::Debug for ObjectCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.lock();
        f.debug_struct("ObjectCache")
            .field("len", &cache.len())
            .field("capacity", &cache.cap())
            .finish()
    }
}
