//! Remote Reconnect Probe Task
//!
//! Periodically pings the remote store while the coordinator is in
//! local-only mode. A successful probe is the only event that re-enables
//! remote mode; incidental call successes never do, which keeps the
//! failover state from flapping during a partial outage.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheCoordinator;

/// Spawns a background task that periodically probes the remote store.
///
/// The probe is a no-op while remote mode is active or when no remote
/// endpoint was configured.
///
/// # Arguments
/// * `coordinator` - Shared cache coordinator
/// * `probe_interval_secs` - Interval in seconds between probes
///
/// # Returns
/// A JoinHandle used to abort the task during graceful shutdown.
pub fn spawn_probe_task(
    coordinator: Arc<CacheCoordinator>,
    probe_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(probe_interval_secs);

    tokio::spawn(async move {
        info!(
            interval_secs = probe_interval_secs,
            "Starting remote reconnect probe task"
        );

        loop {
            tokio::time::sleep(interval).await;

            if coordinator.probe_remote().await {
                debug!("Remote mode active");
            } else {
                debug!("Remote mode inactive after probe");
            }
        }
    })
}
