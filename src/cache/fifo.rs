//! Insertion-ordered bucket cache
//!
//! Entries are evicted strictly in the order they were inserted. Reading an
//! entry does not promote it. The whole cache sits behind one mutex; every
//! operation is a short in-memory list mutation, never I/O.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::record::Record;

/// Default capacity: about one month of daily buckets
pub const DEFAULT_CACHE_CAPACITY: usize = 31;

/// The cached, already-deserialized content of one bucket
pub type CachedSet = Arc<HashSet<Record>>;

/// Passive cache statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug)]
struct CacheState<K> {
    entries: VecDeque<(K, CachedSet)>,
    stats: CacheStats,
}

/// Bounded FIFO cache from bucket identity to record set
#[derive(Debug)]
pub struct BucketCache<K> {
    capacity: usize,
    state: Mutex<CacheState<K>>,
}

impl<K: Eq + Clone> BucketCache<K> {
    /// Create a cache holding at most `capacity` buckets.
    ///
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState {
                entries: VecDeque::with_capacity(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K>> {
        // Entries are whole values, so a poisoned deque is still consistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a bucket's cached set
    pub fn get(&self, key: &K) -> Option<CachedSet> {
        let mut state = self.lock();
        let found = state
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, set)| Arc::clone(set));
        match found {
            Some(_) => state.stats.hits += 1,
            None => state.stats.misses += 1,
        }
        found
    }

    /// Like [`BucketCache::get`] but leaves the statistics untouched
    pub fn peek(&self, key: &K) -> Option<CachedSet> {
        self.lock()
            .entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, set)| Arc::clone(set))
    }

    /// Insert a bucket's set, replacing any existing entry for the key and
    /// evicting the oldest entries while the cache is full
    pub fn put(&self, key: K, set: CachedSet) {
        if self.capacity == 0 {
            return;
        }
        let mut state = self.lock();
        state.entries.retain(|(k, _)| *k != key);
        while state.entries.len() >= self.capacity {
            state.entries.pop_front();
            state.stats.evictions += 1;
        }
        state.entries.push_back((key, set));
    }

    /// Remove every entry for the key
    pub fn invalidate(&self, key: &K) {
        self.lock().entries.retain(|(k, _)| k != key);
    }

    pub fn contains(&self, key: &K) -> bool {
        self.lock().entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }
}

impl<K: Eq + Clone> Default for BucketCache<K> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> CachedSet {
        Arc::new(HashSet::new())
    }

    #[test]
    fn test_get_after_put() {
        let cache = BucketCache::new(2);
        cache.put(1u32, set());
        assert!(cache.get(&1).is_some());
        assert!(cache.get(&2).is_none());
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_peek_does_not_count() {
        let cache = BucketCache::new(2);
        cache.put(1u32, set());
        assert!(cache.peek(&1).is_some());
        assert!(cache.peek(&2).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_evicts_first_inserted_even_if_read() {
        let cache = BucketCache::new(3);
        cache.put(1u32, set());
        cache.put(2, set());
        cache.put(3, set());

        for _ in 0..10 {
            assert!(cache.get(&1).is_some());
        }

        cache.put(4, set());
        assert!(!cache.contains(&1));
        assert!(cache.contains(&2));
        assert!(cache.contains(&3));
        assert!(cache.contains(&4));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_put_replaces_existing_key() {
        let cache = BucketCache::new(3);
        cache.put(1u32, set());
        cache.put(1, set());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_removes_key() {
        let cache = BucketCache::new(3);
        cache.put(1u32, set());
        cache.put(2, set());
        cache.invalidate(&1);
        assert!(!cache.contains(&1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = BucketCache::new(0);
        cache.put(1u32, set());
        assert!(cache.is_empty());
    }
}
