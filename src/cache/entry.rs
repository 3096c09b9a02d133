//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// The value is immutable once stored; `last_accessed` is the only field
/// mutated after insertion, and only by reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored response payload
    pub value: String,
    /// Creation timestamp (Unix milliseconds), never mutated
    pub created_at: u64,
    /// Last successful read timestamp (Unix milliseconds); eviction ordering only
    pub last_accessed: u64,
    /// TTL in seconds relative to `created_at`, None = no expiration
    pub ttl_secs: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl_secs` - Optional TTL in seconds; None never expires
    pub fn new(value: String, ttl_secs: Option<u64>) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            created_at: now,
            last_accessed: now,
            ttl_secs,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired when the current time is
    /// greater than or equal to `created_at + ttl`, so an entry is
    /// semantically absent the instant its TTL elapses.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Expiry check against an explicit clock reading.
    ///
    /// Used where one sweep evaluates many entries against the same instant.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at_ms() {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Expiry Timestamp ==
    /// Absolute expiry instant (Unix milliseconds), None = never expires.
    pub fn expires_at_ms(&self) -> Option<u64> {
        self.ttl_secs
            .map(|ttl| self.created_at.saturating_add(ttl.saturating_mul(1000)))
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the entry has expired.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at_ms().map(|expires| {
            let now = current_timestamp_ms();
            expires.saturating_sub(now)
        })
    }

    // == Touch ==
    /// Records a successful read for eviction ordering.
    pub fn touch(&mut self) {
        self.last_accessed = current_timestamp_ms();
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
