// src/cache/mod.rs
pub mod fingerprint;
pub mod store;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::debug;

use crate::error::Result;
pub use fingerprint::{Fingerprint, FingerprintBuilder};
pub use store::{BoundedStore, CacheStore, MemoryStore};

/// Hit/miss counters of one cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoizes a producer per content fingerprint.
///
/// A key is computed at most once while it stays in the store; concurrent
/// callers with the same key block on the first computation. Failed
/// computations are not stored.
pub struct Cache<V> {
    name: &'static str,
    store: Box<dyn CacheStore<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Send + Sync + 'static> Cache<V> {
    /// Cache over an unbounded in-memory store.
    pub fn new(name: &'static str) -> Self {
        Self::with_store(name, Box::new(MemoryStore::new()))
    }

    pub fn with_store(name: &'static str, store: Box<dyn CacheStore<V>>) -> Self {
        Self {
            name,
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the value stored for `key`, running `producer` only if there is none.
    pub fn memoize<F>(&self, key: &Fingerprint, producer: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = self.store.slot(key);
        if let Some(v) = slot.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(cache = self.name, key = ?key, "cache hit");
            return Ok(Arc::clone(v));
        }

        let mut computed = false;
        let value = match slot.get_or_try_init(|| {
            computed = true;
            producer().map(Arc::new)
        }) {
            Ok(v) => v,
            Err(e) => {
                self.store.remove_if_empty(key);
                return Err(e);
            }
        };
        if computed {
            self.misses.fetch_add(1, Ordering::Relaxed);
            self.store.filled(key);
            debug!(cache = self.name, key = ?key, "cache miss, stored");
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Arc::clone(value))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn clear(&self) {
        self.store.clear();
    }
}
