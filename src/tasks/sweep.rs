//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries, so
//! individual reads never pay for a full scan.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheCoordinator;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task sleeps for the configured interval between runs and takes the
/// store lock only for the sweep itself.
///
/// # Arguments
/// * `coordinator` - Shared cache coordinator
/// * `sweep_interval_secs` - Interval in seconds between sweep runs
///
/// # Returns
/// A JoinHandle used to abort the task during graceful shutdown.
pub fn spawn_sweep_task(
    coordinator: Arc<CacheCoordinator>,
    sweep_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs);

    tokio::spawn(async move {
        info!(
            interval_secs = sweep_interval_secs,
            "Starting TTL sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = coordinator.sweep_expired().await;
            if removed > 0 {
                info!(removed, "TTL sweep removed expired entries");
            } else {
                debug!("TTL sweep found no expired entries");
            }
        }
    })
}
