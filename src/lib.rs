//! Answer Cache - resilient response caching for an LLM tutoring bot
//!
//! Sits between the bot's content/topic/test services and the upstream LLM
//! API. Repeated questions are answered from a bounded in-process LRU/TTL
//! store, optionally backed by a shared Redis tier with automatic failover
//! to local-only mode when the backend is unreachable.

pub mod cache;
pub mod config;
pub mod error;
pub mod key;
pub mod persist;
pub mod remote;
pub mod tasks;
pub mod upstream;

pub use cache::{CacheCoordinator, CacheEntry, CacheStats, LocalStore, StatsReport};
pub use config::Config;
pub use error::{PersistError, RemoteError, UpstreamError};
pub use key::{derive_key, GenerationParams};
pub use persist::PersistenceManager;
pub use remote::RemoteStore;
pub use tasks::{spawn_probe_task, spawn_snapshot_task, spawn_sweep_task};
pub use upstream::{Generation, GenerationRequest, UpstreamGateway};
