//! Local Store Module
//!
//! In-process cache tier: HashMap storage with LRU eviction and TTL
//! expiration. Operations never block on I/O and never fail; capacity
//! pressure is resolved silently by evicting the least recently used
//! entry.

use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::cache::entry::current_timestamp_ms;

// == Local Store ==
/// Bounded in-memory store with LRU eviction and TTL support.
#[derive(Debug)]
pub struct LocalStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl LocalStore {
    // == Constructor ==
    /// Creates a new LocalStore with the specified capacity.
    ///
    /// Capacity is clamped to a minimum of 1 so the eviction loop can
    /// always make progress.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None if the key is missing or its TTL has elapsed; expired
    /// entries are removed lazily on access. A hit refreshes the entry's
    /// recency and increments `hits`; any absence increments `misses`.
    pub fn get(&mut self, key: &str) -> Option<String> {
        match self.entries.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.lru.remove(key);
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                entry.touch();
                let value = entry.value.clone();
                self.stats.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair with optional TTL.
    ///
    /// Overwriting an existing key replaces its value and resets
    /// `created_at` and TTL. A new key at capacity first evicts the least
    /// recently used entry.
    pub fn set(&mut self, key: String, value: String, ttl_secs: Option<u64>) {
        let is_overwrite = self.entries.contains_key(&key);
        if !is_overwrite {
            self.evict_to_fit();
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, ttl_secs));
        self.lru.touch(&key);
        self.stats.record_set();
    }

    // == Insert Entry ==
    /// Inserts a pre-built entry, preserving its `created_at` and TTL.
    ///
    /// Used for remote backfill and snapshot restore, where expiry must
    /// stay relative to the original creation time rather than being
    /// reset. Evicts like `set` but does not count toward `sets`.
    pub fn insert_entry(&mut self, key: String, entry: CacheEntry) {
        if !self.entries.contains_key(&key) {
            self.evict_to_fit();
        }
        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
    }

    // == Remove ==
    /// Removes an entry by key, returning whether it existed.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru.remove(key);
            self.stats.record_remove();
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Empties the store.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.stats.record_clear();
    }

    // == Clear Matching ==
    /// Removes all entries whose key satisfies the predicate.
    ///
    /// Matching is on keys only; payloads are never scanned. Returns the
    /// number of entries removed, each counted under `removes`.
    pub fn clear_matching<F>(&mut self, pred: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let matched: Vec<String> = self
            .entries
            .keys()
            .filter(|k| pred(k))
            .cloned()
            .collect();

        for key in &matched {
            self.entries.remove(key);
            self.lru.remove(key);
            self.stats.record_remove();
        }
        matched.len()
    }

    // == Sweep Expired ==
    /// Removes all entries past their TTL, returning the count removed.
    ///
    /// Called periodically by the background sweep task so individual
    /// reads never pay for a full scan. All entries are judged against a
    /// single clock reading.
    pub fn sweep_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.remove(key);
            self.lru.remove(key);
        }
        expired.len()
    }

    // == Peek ==
    /// Looks up an entry without touching recency or counters.
    ///
    /// Used by the coordinator to clone a just-written entry for the
    /// write-through path. Expired entries are still returned; callers on
    /// the read path must use `get`.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Stats ==
    /// Returns a snapshot of the operation counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Zeroes the operation counters. Operator action only.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    // == Accessors ==
    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    // == Snapshot Entries ==
    /// Clones the live entry map for persistence.
    ///
    /// The clone is taken under the caller's lock; serialization and disk
    /// I/O then happen outside it.
    pub fn snapshot_entries(&self) -> HashMap<String, CacheEntry> {
        self.entries.clone()
    }

    // == Eviction ==
    /// Evicts least-recently-used entries until one slot is free.
    fn evict_to_fit(&mut self) {
        while self.entries.len() >= self.max_entries {
            match self.lru.evict_oldest() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                    self.stats.record_eviction();
                }
                // Tracker and map can only diverge through a bug; bail
                // rather than loop forever.
                None => break,
            }
        }
    }
}
