//! Cache statistics tracking

use std::sync::atomic::{AtomicU64, Ordering};

/// Hit/miss counters for a key cache
///
/// Counters are relaxed atomics, updated alongside the cache operations but
/// never consulted by them. Read them together through [`CacheStats::snapshot`]
/// when the values must agree with each other.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Lookups that found their key
    pub hits: u64,
    /// Lookups that did not
    pub misses: u64,
    /// Calls to insert, including refreshes of present keys
    pub inserts: u64,
    /// Keys dropped to stay within capacity
    pub evictions: u64,
}

impl StatsSnapshot {
    /// Total lookups, hit or miss
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of lookups that hit, 0.0 before any lookup
    pub fn hit_ratio(&self) -> f64 {
        match self.lookups() {
            0 => 0.0,
            lookups => self.hits as f64 / lookups as f64,
        }
    }
}

impl CacheStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        Self::bump(&self.hits);
    }

    pub(crate) fn record_miss(&self) {
        Self::bump(&self.misses);
    }

    pub(crate) fn record_insert(&self) {
        Self::bump(&self.inserts);
    }

    pub(crate) fn record_eviction(&self) {
        Self::bump(&self.evictions);
    }

    /// Lookups that found their key
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Lookups that did not
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Calls to insert
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Keys evicted
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Copy the current counter values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            inserts: self.inserts(),
            evictions: self.evictions(),
        }
    }

    /// Hit ratio of the current counters, see [`StatsSnapshot::hit_ratio`]
    pub fn hit_ratio(&self) -> f64 {
        self.snapshot().hit_ratio()
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.inserts, &self.evictions] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
