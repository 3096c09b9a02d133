//! Periodic Snapshot Task
//!
//! Saves the local store to disk on a fixed interval, complementing the
//! every-N-writes trigger inside the coordinator. I/O cost stays bounded
//! because neither trigger fires on every write.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheCoordinator;

/// Spawns a background task that periodically snapshots the local store.
///
/// # Arguments
/// * `coordinator` - Shared cache coordinator
/// * `snapshot_interval_secs` - Interval in seconds between snapshots
///
/// # Returns
/// A JoinHandle used to abort the task during graceful shutdown; callers
/// should also invoke `CacheCoordinator::flush` at shutdown for a final
/// snapshot.
pub fn spawn_snapshot_task(
    coordinator: Arc<CacheCoordinator>,
    snapshot_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(snapshot_interval_secs);

    tokio::spawn(async move {
        info!(
            interval_secs = snapshot_interval_secs,
            "Starting periodic snapshot task"
        );

        loop {
            tokio::time::sleep(interval).await;
            coordinator.snapshot_now().await;
            debug!("Periodic snapshot completed");
        }
    })
}
