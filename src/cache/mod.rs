//! Cache Module
//!
//! The two cache tiers and their coordinator. `LocalStore` is the
//! in-process tier with TTL expiration and LRU eviction; `CacheCoordinator`
//! layers the remote tier, failover, and persistence on top and is the
//! only type other subsystems call.

pub(crate) mod entry;
mod coordinator;
mod local;
mod lru;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use coordinator::CacheCoordinator;
pub use entry::CacheEntry;
pub use local::LocalStore;
pub use lru::LruTracker;
pub use stats::{CacheStats, StatsReport};
