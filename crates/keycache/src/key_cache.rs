//! LRU existence cache over 64-bit fingerprints
//!
//! Recency is tracked with a per-instance logical clock rather than a linked
//! list. Eviction scans every entry for the oldest clock value, which keeps
//! the store to a single map and is cheap for the small capacities this is
//! meant for (tens to low hundreds of keys).

use std::collections::HashMap;

use ahash::RandomState;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::stats::CacheStats;
use crate::trace::{LookupStats, LookupTracer};

/// Upper bound on map slots reserved at construction
const PREALLOC_LIMIT: usize = 1024;

/// State guarded by the cache lock
struct Inner {
    /// fingerprint -> clock value of its last touch
    entries: HashMap<u64, u64, RandomState>,

    /// Bumped before every write, so stored clock values are unique
    clock: u64,
}

/// Bounded, thread-safe cache answering "have I seen this key before?"
///
/// Keys are `u64` fingerprints of the caller's input rather than the input
/// itself, so large strings cost eight bytes each once admitted. When the
/// cache is full, inserting a new key evicts the least recently touched one.
///
/// # Fingerprint provenance
///
/// Fingerprints are only meaningful for the instance that produced them.
/// Every cache draws its own random hash seed, so a key made by one cache
/// and looked up in another gives a meaningless (but harmless) answer. The
/// cache cannot detect this: it never stores the original input.
///
/// Distinct inputs may collide on the same fingerprint. A collision reads as
/// a false "seen before" and is not corrected.
pub struct LruKeyCache {
    /// Fixed at construction; `make_key` reads it without locking
    seed: RandomState,

    inner: Mutex<Inner>,

    stats: CacheStats,

    capacity: usize,
}

impl LruKeyCache {
    /// Create a new cache retaining at most `capacity` keys
    ///
    /// # Panics
    /// Panics if `capacity` is zero. Use [`LruKeyCache::try_new`] to get an
    /// error instead.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self::with_seed(capacity, RandomState::new())
    }

    /// Create a new cache, rejecting a zero capacity
    pub fn try_new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::ZeroCapacity);
        }
        Ok(Self::with_seed(capacity, RandomState::new()))
    }

    fn with_seed(capacity: usize, seed: RandomState) -> Self {
        debug!(capacity, "creating key cache");

        Self {
            seed,
            inner: Mutex::new(Inner {
                // One slot of headroom: an insert overflows by one before evicting.
                entries: HashMap::with_capacity_and_hasher(
                    capacity.saturating_add(1).min(PREALLOC_LIMIT),
                    RandomState::new(),
                ),
                clock: 0,
            }),
            stats: CacheStats::new(),
            capacity,
        }
    }

    /// Make a fingerprint for `input`
    ///
    /// The same input always gives the same fingerprint for this instance.
    /// Lookups and inserts on this cache must use fingerprints made here.
    pub fn make_key(&self, input: &str) -> u64 {
        self.seed.hash_one(input)
    }

    /// Check whether `key` is cached
    ///
    /// Returns the number of keys in the cache, which is valid whether or not
    /// the key was found. A hit marks the key as most recently used.
    pub fn lookup(&self, key: u64) -> (usize, bool) {
        let mut inner = self.inner.lock();
        let Inner { entries, clock } = &mut *inner;

        match entries.get_mut(&key) {
            Some(touched) => {
                *clock += 1;
                *touched = *clock;
                self.stats.record_hit();
                (entries.len(), true)
            }
            None => {
                self.stats.record_miss();
                (entries.len(), false)
            }
        }
    }

    /// Insert `key`, or refresh it if already present
    ///
    /// If this pushes the cache past its capacity, the least recently used
    /// key is evicted. Returns the number of keys in the cache afterwards.
    pub fn insert(&self, key: u64) -> usize {
        let mut inner = self.inner.lock();
        inner.clock += 1;
        let now = inner.clock;
        inner.entries.insert(key, now);
        self.stats.record_insert();

        if inner.entries.len() > self.capacity {
            let lru = inner
                .entries
                .iter()
                .min_by_key(|&(_, &touched)| touched)
                .map(|(&k, _)| k);

            if let Some(lru) = lru {
                inner.entries.remove(&lru);
                self.stats.record_eviction();
                trace!(key = lru, "evicted least recently used key");
            }
        }

        inner.entries.len()
    }

    /// Make a key for `input`, look it up, and insert it on a miss
    ///
    /// Reports the outcome to `tracer` and returns the same pair: the number
    /// of keys afterwards, and whether `input` was already cached.
    pub fn check(&self, input: &str, tracer: &dyn LookupTracer) -> (usize, bool) {
        let finish = tracer.trace_lookup();
        let key = self.make_key(input);

        let (len, found) = self.lookup(key);
        let cache_len = if found { len } else { self.insert(key) };

        finish(LookupStats {
            cache_hit: found,
            cache_len,
        });
        (cache_len, found)
    }

    /// Maximum number of keys retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of keys
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if the cache holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss statistics for this cache
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::NoopTracer;
    use std::sync::{Arc, Mutex as StdMutex};
    use std::thread;

    #[test]
    fn test_lru_key_cache() {
        let cache = LruKeyCache::new(3);
        let key1 = cache.make_key("key1");
        let key2 = cache.make_key("key2");
        let key3 = cache.make_key("key3");
        let key4 = cache.make_key("key4");

        for key in [key1, key2, key3, key4] {
            assert_eq!(cache.lookup(key), (0, false));
        }

        assert_eq!(cache.insert(key1), 1);
        assert_eq!(cache.lookup(key1), (1, true));
        assert_eq!(cache.insert(key2), 2);
        assert_eq!(cache.lookup(key2), (2, true));
        assert_eq!(cache.insert(key3), 3);
        assert_eq!(cache.lookup(key3), (3, true));

        // key2 becomes LRU
        assert_eq!(cache.lookup(key1), (3, true));

        assert_eq!(cache.insert(key4), 3);

        // Remake the keys: the seed must not change between calls.
        let key1 = cache.make_key("key1");
        let key2 = cache.make_key("key2");
        let key3 = cache.make_key("key3");
        let key4 = cache.make_key("key4");

        assert_eq!(cache.lookup(key1), (3, true));
        assert_eq!(cache.lookup(key2), (3, false));
        assert_eq!(cache.lookup(key3), (3, true));
        assert_eq!(cache.lookup(key4), (3, true));
    }

    #[test]
    fn test_make_key_deterministic() {
        let cache = LruKeyCache::new(4);

        assert_eq!(cache.make_key("query { a }"), cache.make_key("query { a }"));
        assert_ne!(cache.make_key("query { a }"), cache.make_key("query { b }"));
        assert_ne!(cache.make_key(""), cache.make_key(" "));
    }

    #[test]
    fn test_make_key_per_instance_seed() {
        let a = LruKeyCache::new(4);
        let b = LruKeyCache::new(4);

        assert_ne!(a.make_key("same input"), b.make_key("same input"));
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = LruKeyCache::new(2);
        cache.insert(7);

        assert_eq!(cache.lookup(42), (1, false));
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.insert(42), 2);
        assert_eq!(cache.lookup(42), (2, true));
    }

    #[test]
    fn test_reinsert_keeps_len() {
        let cache = LruKeyCache::new(3);

        assert_eq!(cache.insert(1), 1);
        assert_eq!(cache.insert(2), 2);
        assert_eq!(cache.insert(1), 2);
        assert_eq!(cache.insert(1), 2);
        assert_eq!(cache.stats().evictions(), 0);
    }

    #[test]
    fn test_reinsert_refreshes_recency() {
        let cache = LruKeyCache::new(2);

        cache.insert(1);
        cache.insert(2);
        cache.insert(1); // 2 is now LRU
        cache.insert(3);

        assert!(cache.lookup(1).1);
        assert!(!cache.lookup(2).1);
        assert!(cache.lookup(3).1);
    }

    #[test]
    fn test_evicts_oldest_without_touch() {
        let cache = LruKeyCache::new(3);

        for key in 1..=4 {
            cache.insert(key);
        }

        assert_eq!(cache.lookup(1), (3, false));
        for key in 2..=4 {
            assert_eq!(cache.lookup(key), (3, true));
        }
    }

    #[test]
    fn test_capacity_bound() {
        let cache = LruKeyCache::new(5);

        for key in 0..100u64 {
            let len = cache.insert(key.wrapping_mul(0x9e37_79b9_7f4a_7c15));
            assert_eq!(len, (key as usize + 1).min(5));
        }
        assert_eq!(cache.len(), cache.capacity());
        assert_eq!(cache.stats().evictions(), 95);
    }

    #[test]
    fn test_capacity_one() {
        let cache = LruKeyCache::new(1);

        assert_eq!(cache.insert(10), 1);
        assert_eq!(cache.insert(11), 1);
        assert_eq!(cache.lookup(10), (1, false));
        assert_eq!(cache.lookup(11), (1, true));
    }

    #[test]
    fn test_foreign_key_accepted() {
        let cache = LruKeyCache::new(2);

        assert_eq!(cache.insert(u64::MAX), 1);
        assert_eq!(cache.insert(0), 2);
        assert_eq!(cache.lookup(u64::MAX), (2, true));
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        let _ = LruKeyCache::new(0);
    }

    #[test]
    fn test_try_new() {
        assert!(matches!(LruKeyCache::try_new(0), Err(Error::ZeroCapacity)));

        let cache = LruKeyCache::try_new(8).unwrap();
        assert_eq!(cache.capacity(), 8);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stats_counted() {
        let cache = LruKeyCache::new(1);

        cache.lookup(1); // miss
        cache.insert(1);
        cache.lookup(1); // hit
        cache.insert(2); // evicts 1

        let stats = cache.stats();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.inserts(), 2);
        assert_eq!(stats.evictions(), 1);
    }

    #[test]
    fn test_check_reports_to_tracer() {
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let tracer = {
            let seen = Arc::clone(&seen);
            move || -> crate::trace::TraceFinish {
                let seen = Arc::clone(&seen);
                Box::new(move |stats: LookupStats| seen.lock().unwrap().push(stats))
            }
        };

        let cache = LruKeyCache::new(2);
        assert_eq!(cache.check("a", &tracer), (1, false));
        assert_eq!(cache.check("a", &tracer), (1, true));
        assert_eq!(cache.check("b", &tracer), (2, false));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                LookupStats {
                    cache_hit: false,
                    cache_len: 1,
                },
                LookupStats {
                    cache_hit: true,
                    cache_len: 1,
                },
                LookupStats {
                    cache_hit: false,
                    cache_len: 2,
                },
            ]
        );
    }

    #[test]
    fn test_check_with_noop_tracer() {
        let cache = LruKeyCache::new(2);

        assert_eq!(cache.check("a", &NoopTracer), (1, false));
        assert_eq!(cache.check("a", &NoopTracer), (1, true));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_huge_capacity() {
        for capacity in [usize::MAX, 1usize << 62] {
            let cache = LruKeyCache::try_new(capacity).unwrap();
            assert_eq!(cache.capacity(), capacity);

            let key = cache.make_key("huge");
            assert_eq!(cache.lookup(key), (0, false));
            assert_eq!(cache.insert(key), 1);
            assert_eq!(cache.lookup(key), (1, true));
        }
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(LruKeyCache::new(16));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..1000 {
                        let key = cache.make_key(&format!("t{}-{}", t, i % 32));
                        let (len, found) = cache.lookup(key);
                        assert!(len <= 16);
                        if !found {
                            assert!(cache.insert(key) <= 16);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 16);
        let stats = cache.stats();
        assert_eq!(stats.hits() + stats.misses(), 8000);
        assert_eq!(stats.inserts(), stats.misses());
    }
}
