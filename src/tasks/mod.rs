//! Background Tasks Module
//!
//! Periodic maintenance loops that run alongside request handling and
//! never block it: each takes its turn on the store lock like any other
//! caller.
//!
//! # Tasks
//! - Expiry sweep: removes entries past their TTL
//! - Snapshot: persists the local store to disk
//! - Reconnect probe: the only path out of local-only mode

mod probe;
mod snapshot;
mod sweep;

pub use probe::spawn_probe_task;
pub use snapshot::spawn_snapshot_task;
pub use sweep::spawn_sweep_task;
