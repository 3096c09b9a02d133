//! Cache Statistics Module
//!
//! Tracks cache performance metrics. Counters are monotonically
//! increasing for the process lifetime; only an explicit operator
//! `reset` zeroes them.

use serde::Serialize;

// == Cache Stats ==
/// Per-store operation counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of insertions (including overwrites)
    pub sets: u64,
    /// Number of entries evicted by the LRU policy
    pub evictions: u64,
    /// Number of explicit removals
    pub removes: u64,
    /// Number of full clears
    pub clears: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Recorders ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Increments the set counter.
    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Increments the eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Increments the removal counter.
    pub fn record_remove(&mut self) {
        self.removes += 1;
    }

    /// Increments the clear counter.
    pub fn record_clear(&mut self) {
        self.clears += 1;
    }

    // == Reset ==
    /// Zeroes all counters. Operator action only.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Stats Report ==
/// Merged view of both tiers, produced by the coordinator.
///
/// Serializable so the admin dashboard can render it without reaching
/// into cache internals.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Local-tier hit count
    pub hits: u64,
    /// Local-tier miss count
    pub misses: u64,
    /// Local-tier insertions
    pub sets: u64,
    /// Local-tier LRU evictions
    pub evictions: u64,
    /// Local-tier explicit removals
    pub removes: u64,
    /// Local-tier full clears
    pub clears: u64,
    /// Remote-tier operation failures since startup
    pub remote_errors: u64,
    /// Current number of local entries
    pub local_size: usize,
    /// Configured local capacity
    pub capacity: usize,
    /// local_size / capacity, as a percentage
    pub fill_percentage: f64,
    /// Whether the distributed tier is currently in use
    pub using_remote: bool,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}
