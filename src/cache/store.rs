// src/cache/store.rs

use once_cell::sync::OnceCell;
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use super::Fingerprint;

/// One write-once cell per key.
pub type Slot<V> = Arc<OnceCell<Arc<V>>>;

/// Backing storage for a [`Cache`](super::Cache).
///
/// `slot` must hand out the same cell for equal keys for as long as the key
/// is retained, so that concurrent callers race on one cell.
pub trait CacheStore<V>: Send + Sync {
    fn slot(&self, key: &Fingerprint) -> Slot<V>;
    /// Drop the slot for `key` if it holds no value (its computation failed).
    fn remove_if_empty(&self, key: &Fingerprint);
    /// Called once the slot for `key` has been filled.
    fn filled(&self, _key: &Fingerprint) {}
    fn len(&self) -> usize;
    fn clear(&self);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded map of key → slot.
pub struct MemoryStore<V> {
    map: RwLock<HashMap<Fingerprint, Slot<V>>>,
}

impl<V> Default for MemoryStore<V> {
    fn default() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> MemoryStore<V> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Send + Sync> CacheStore<V> for MemoryStore<V> {
    fn slot(&self, key: &Fingerprint) -> Slot<V> {
        // fast path under the read lock
        {
            let map_r = self.map.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = map_r.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut map_w = self.map.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map_w.entry(*key).or_default())
    }

    fn remove_if_empty(&self, key: &Fingerprint) {
        let mut map_w = self.map.write().unwrap_or_else(PoisonError::into_inner);
        if map_w.get(key).is_some_and(|slot| slot.get().is_none()) {
            map_w.remove(key);
        }
    }

    fn len(&self) -> usize {
        self.map.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn clear(&self) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Keeps at most `capacity` filled keys, evicting the oldest filled insertion
/// first. Slots still being computed are never evicted, and eviction only
/// happens once a new value lands. Evicted keys are recomputed on their next
/// request.
pub struct BoundedStore<V> {
    capacity: usize,
    inner: Mutex<BoundedInner<V>>,
}

struct BoundedInner<V> {
    map: HashMap<Fingerprint, Slot<V>>,
    order: VecDeque<Fingerprint>,
}

impl<V> BoundedStore<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(BoundedInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }
}

impl<V: Send + Sync> CacheStore<V> for BoundedStore<V> {
    fn slot(&self, key: &Fingerprint) -> Slot<V> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = inner.map.get(key) {
            return Arc::clone(slot);
        }
        let slot: Slot<V> = Arc::default();
        inner.map.insert(*key, Arc::clone(&slot));
        inner.order.push_back(*key);
        slot
    }

    fn remove_if_empty(&self, key: &Fingerprint) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let BoundedInner { map, order } = &mut *inner;
        if map.get(key).is_some_and(|slot| slot.get().is_none()) {
            map.remove(key);
            order.retain(|k| k != key);
        }
    }

    fn filled(&self, key: &Fingerprint) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let BoundedInner { map, order } = &mut *inner;
        let mut full = map.values().filter(|slot| slot.get().is_some()).count();
        while full > self.capacity {
            let oldest = order
                .iter()
                .position(|k| k != key && map.get(k).is_some_and(|slot| slot.get().is_some()));
            let Some(pos) = oldest else { break };
            if let Some(old) = order.remove(pos) {
                map.remove(&old);
            }
            full -= 1;
        }
    }

    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .len()
    }

    fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.map.clear();
        inner.order.clear();
    }
}
