use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use parking_lot::RwLock;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn combine(self, other: CacheStats) -> CacheStats {
        CacheStats {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            entries: self.entries + other.entries,
        }
    }
}

/// Memoized neighbor lists for one side of the membership table.
///
/// Membership edges never change while a search runs, so entries stay valid
/// until the store ingests new data and calls [`NeighborCache::clear`].
/// Once `capacity` entries are held, further lists are served but not kept.
pub struct NeighborCache {
    inner: RwLock<AHashMap<i64, Vec<i64>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for NeighborCache {
    fn default() -> Self {
        Self::with_capacity(usize::MAX)
    }
}

impl NeighborCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(AHashMap::new()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: i64) -> Option<Vec<i64>> {
        if let Some(value) = self.inner.read().get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(value)
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    pub fn insert(&self, key: i64, value: Vec<i64>) {
        let mut inner = self.inner.write();
        if inner.len() < self.capacity || inner.contains_key(&key) {
            inner.insert(key, value);
        }
    }

    pub fn clear(&self) {
        self.inner.write().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.inner.read().len(),
        }
    }
}
