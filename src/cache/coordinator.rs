//! Cache Coordinator Module
//!
//! The single public cache contract. Orchestrates reads and writes across
//! the local and remote tiers, owns the failover state machine, and merges
//! statistics from both tiers. Consumers receive one process-wide instance
//! by dependency injection; it is never re-constructed per request.
//!
//! Lock discipline: the local store lock covers map mutation only and is
//! never held across a remote call or disk write.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, LocalStore, StatsReport};
use crate::config::Config;
use crate::error::RemoteError;
use crate::persist::PersistenceManager;
use crate::remote::RemoteStore;

// == Cache Coordinator ==
/// Two-tier cache with write-through, remote failover, and periodic
/// snapshotting.
#[derive(Debug)]
pub struct CacheCoordinator {
    /// In-process tier; the lock scope is map mutation only
    local: RwLock<LocalStore>,
    /// Distributed tier; None when no endpoint was configured
    remote: Option<RemoteStore>,
    /// Failover flag: true while the remote tier is trusted
    using_remote: AtomicBool,
    /// Remote operation failures since startup
    remote_errors: AtomicU64,
    /// Snapshot save/load for the local tier
    persistence: PersistenceManager,
    /// Writes since the last snapshot
    writes_since_snapshot: AtomicU64,
    /// Snapshot after this many writes
    snapshot_every_writes: u64,
}

impl CacheCoordinator {
    // == Constructor ==
    /// Builds the coordinator from configuration.
    ///
    /// Loads the local snapshot (expired entries dropped, survivors
    /// replayed in access order so LRU ordering survives a restart) and
    /// prepares the remote tier when an endpoint is configured. Remote
    /// mode starts enabled only if an endpoint exists; an unparsable
    /// endpoint is logged and treated as not configured.
    pub fn new(config: &Config) -> Self {
        let persistence = PersistenceManager::new(config.snapshot_path.clone());
        let mut local = LocalStore::new(config.max_entries);

        // Replay the snapshot oldest-access-first so the LRU tracker ends
        // up in the same order it was saved in.
        let mut restored: Vec<(String, CacheEntry)> = persistence
            .load()
            .into_iter()
            .filter(|(_, entry)| !entry.is_expired())
            .collect();
        restored.sort_by_key(|(_, entry)| entry.last_accessed);
        let restored_count = restored.len();
        for (key, entry) in restored {
            local.insert_entry(key, entry);
        }
        if restored_count > 0 {
            info!(entries = restored_count, "Local store restored from snapshot");
        }

        let remote = match config.redis_url.as_deref() {
            Some(url) => match RemoteStore::new(
                url,
                &config.remote_namespace,
                config.remote_timeout_ms,
            ) {
                Ok(store) => Some(store),
                Err(e) => {
                    warn!(error = %e, "Invalid remote endpoint, running local-only");
                    None
                }
            },
            None => None,
        };
        let remote_configured = remote.is_some();

        Self {
            local: RwLock::new(local),
            remote,
            using_remote: AtomicBool::new(remote_configured),
            remote_errors: AtomicU64::new(0),
            persistence,
            writes_since_snapshot: AtomicU64::new(0),
            snapshot_every_writes: config.snapshot_every_writes.max(1),
        }
    }

    // == Get ==
    /// Reads a value by fingerprint: local tier first, then remote.
    ///
    /// A remote hit backfills the local tier with the entry's original
    /// `created_at`, so the TTL keeps running from the original write
    /// rather than restarting. Remote failures surface only as counters.
    pub async fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.local.write().await.get(key) {
            return Some(value);
        }

        if !self.remote_active() {
            return None;
        }
        let remote = self.remote.as_ref()?;

        match remote.get(key).await {
            Ok(Some(entry)) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.local.write().await.insert_entry(key.to_string(), entry);
                debug!(key = %short(key), "Remote hit backfilled locally");
                Some(value)
            }
            // Native backend expiry lagged the envelope TTL; treat as absent
            Ok(Some(_)) | Ok(None) => None,
            Err(e) => {
                self.note_remote_error(&e);
                None
            }
        }
    }

    // == Set ==
    /// Stores a value by fingerprint, write-through.
    ///
    /// The local write is unconditional and immediately visible; a remote
    /// failure never rolls it back. Every Nth write also snapshots the
    /// local tier.
    pub async fn set(&self, key: &str, value: String, ttl_secs: Option<u64>) {
        let entry = {
            let mut local = self.local.write().await;
            local.set(key.to_string(), value, ttl_secs);
            local.peek(key).cloned()
        };

        if self.remote_active() {
            if let (Some(remote), Some(entry)) = (self.remote.as_ref(), entry) {
                if let Err(e) = remote.set(key, &entry).await {
                    self.note_remote_error(&e);
                }
            }
        }

        let writes = self.writes_since_snapshot.fetch_add(1, Ordering::SeqCst) + 1;
        if writes >= self.snapshot_every_writes {
            self.writes_since_snapshot.store(0, Ordering::SeqCst);
            self.snapshot_now().await;
        }
    }

    // == Remove ==
    /// Removes a fingerprint from both tiers.
    ///
    /// Remote removal is best-effort; the return value reports whether the
    /// key existed in either tier.
    pub async fn remove(&self, key: &str) -> bool {
        let existed_locally = self.local.write().await.remove(key);

        let mut existed_remotely = false;
        if self.remote_active() {
            if let Some(remote) = self.remote.as_ref() {
                match remote.remove(key).await {
                    Ok(existed) => existed_remotely = existed,
                    Err(e) => self.note_remote_error(&e),
                }
            }
        }

        existed_locally || existed_remotely
    }

    // == Clear ==
    /// Empties both tiers. Remote clearing is best-effort.
    pub async fn clear(&self) {
        self.local.write().await.clear();

        if self.remote_active() {
            if let Some(remote) = self.remote.as_ref() {
                if let Err(e) = remote.clear().await {
                    self.note_remote_error(&e);
                }
            }
        }
    }

    // == Clear Matching ==
    /// Removes entries whose key satisfies the predicate, in both tiers.
    ///
    /// Returns the count removed from the local tier; the remote tier is
    /// cleared best-effort with the same predicate.
    pub async fn clear_matching<F>(&self, pred: F) -> usize
    where
        F: Fn(&str) -> bool,
    {
        let removed = self.local.write().await.clear_matching(&pred);

        if self.remote_active() {
            if let Some(remote) = self.remote.as_ref() {
                if let Err(e) = remote.clear_matching(&pred).await {
                    self.note_remote_error(&e);
                }
            }
        }

        removed
    }

    // == Stats ==
    /// Merged statistics across both tiers.
    pub async fn stats(&self) -> StatsReport {
        let (stats, local_size, capacity) = {
            let local = self.local.read().await;
            (local.stats(), local.len(), local.capacity())
        };

        StatsReport {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            sets: stats.sets,
            evictions: stats.evictions,
            removes: stats.removes,
            clears: stats.clears,
            remote_errors: self.remote_errors.load(Ordering::SeqCst),
            local_size,
            capacity,
            fill_percentage: (local_size as f64 / capacity as f64) * 100.0,
            using_remote: self.using_remote(),
        }
    }

    /// Zeroes the local operation counters. Operator action only.
    pub async fn reset_stats(&self) {
        self.local.write().await.reset_stats();
        self.remote_errors.store(0, Ordering::SeqCst);
    }

    // == Failover ==
    /// True while the remote tier is configured and trusted.
    pub fn using_remote(&self) -> bool {
        self.remote.is_some() && self.using_remote.load(Ordering::SeqCst)
    }

    /// Gate for the remote call sites; skipping them entirely in
    /// local-only mode is what stops the error counter from climbing
    /// during an outage.
    fn remote_active(&self) -> bool {
        self.using_remote()
    }

    /// Records a remote failure and degrades to local-only mode.
    ///
    /// The flag is flipped with a swap so the transition is logged exactly
    /// once no matter how many failures race.
    fn note_remote_error(&self, error: &RemoteError) {
        self.remote_errors.fetch_add(1, Ordering::SeqCst);
        if self.using_remote.swap(false, Ordering::SeqCst) {
            warn!(error = %error, "Remote store failed, degrading to local-only mode");
        } else {
            debug!(error = %error, "Remote store still failing");
        }
    }

    /// Attempts to re-enable the remote tier.
    ///
    /// Called by the background probe task; a successful PING is the only
    /// path from local-only back to remote mode, so a single lucky call
    /// mid-outage cannot flap the state. Returns whether remote mode is
    /// active afterwards.
    pub async fn probe_remote(&self) -> bool {
        let Some(remote) = self.remote.as_ref() else {
            return false;
        };
        if self.using_remote.load(Ordering::SeqCst) {
            return true;
        }

        match remote.ping().await {
            Ok(()) => {
                self.using_remote.store(true, Ordering::SeqCst);
                info!("Remote store reachable again, leaving local-only mode");
                true
            }
            Err(e) => {
                self.remote_errors.fetch_add(1, Ordering::SeqCst);
                debug!(error = %e, "Remote probe failed, staying local-only");
                false
            }
        }
    }

    // == Sweep ==
    /// Removes expired local entries, returning the count removed.
    ///
    /// Called by the background sweep task so reads stay free of full
    /// scans; expiry on the read path remains lazy.
    pub async fn sweep_expired(&self) -> usize {
        self.local.write().await.sweep_expired()
    }

    // == Persistence ==
    /// Snapshots the local tier to disk.
    ///
    /// The entry map is cloned under the lock; serialization and disk I/O
    /// run on the blocking pool.
    pub async fn snapshot_now(&self) {
        let entries = self.local.read().await.snapshot_entries();
        let persistence = self.persistence.clone();

        let result = tokio::task::spawn_blocking(move || persistence.save(&entries)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Snapshot save failed"),
            Err(e) => warn!(error = %e, "Snapshot task panicked"),
        }
    }

    /// Flushes state at shutdown: one final snapshot.
    pub async fn flush(&self) {
        self.snapshot_now().await;
    }
}

/// Truncated key form for logs.
///
/// Keys are normally hex fingerprints, but raw keys pass through the
/// same API, so truncation backs off to the nearest char boundary.
fn short(key: &str) -> &str {
    let mut end = 8.min(key.len());
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    &key[..end]
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn local_only_config(dir: &std::path::Path) -> Config {
        Config {
            max_entries: 8,
            snapshot_path: dir.join("snapshot.json"),
            snapshot_every_writes: 1000,
            redis_url: None,
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_set_then_get_same_caller() {
        let dir = tempdir().unwrap();
        let coordinator = CacheCoordinator::new(&local_only_config(dir.path()));

        coordinator.set("k", "v".to_string(), Some(60)).await;
        assert_eq!(coordinator.get("k").await, Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_get_absent() {
        let dir = tempdir().unwrap();
        let coordinator = CacheCoordinator::new(&local_only_config(dir.path()));

        assert_eq!(coordinator.get("missing").await, None);
        assert_eq!(coordinator.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn test_remove_reports_existence() {
        let dir = tempdir().unwrap();
        let coordinator = CacheCoordinator::new(&local_only_config(dir.path()));

        coordinator.set("k", "v".to_string(), None).await;
        assert!(coordinator.remove("k").await);
        assert!(!coordinator.remove("k").await);
    }

    #[tokio::test]
    async fn test_clear_matching_counts_local_removals() {
        let dir = tempdir().unwrap();
        let coordinator = CacheCoordinator::new(&local_only_config(dir.path()));

        coordinator.set("quiz:1", "a".to_string(), None).await;
        coordinator.set("quiz:2", "b".to_string(), None).await;
        coordinator.set("chapter:1", "c".to_string(), None).await;

        let removed = coordinator.clear_matching(|k| k.starts_with("quiz:")).await;
        assert_eq!(removed, 2);
        assert_eq!(coordinator.get("chapter:1").await, Some("c".to_string()));
    }

    #[test]
    fn test_short_truncates_on_char_boundary() {
        assert_eq!(short("abcdef0123456789"), "abcdef01");
        assert_eq!(short("tiny"), "tiny");
        assert_eq!(short(""), "");
        // Multi-byte keys must not be split mid-character
        assert_eq!(short("日本語のキー"), "日本");
    }

    #[tokio::test]
    async fn test_remote_gate_closed_without_remote() {
        let dir = tempdir().unwrap();
        let coordinator = CacheCoordinator::new(&local_only_config(dir.path()));

        // Every operation skips the remote tier when none is configured
        coordinator.set("k", "v".to_string(), None).await;
        coordinator.get("k").await;
        coordinator.remove("k").await;
        coordinator.clear().await;

        assert!(!coordinator.remote_active());
        assert_eq!(coordinator.stats().await.remote_errors, 0);
    }

    #[tokio::test]
    async fn test_no_remote_configured_stays_local_only() {
        let dir = tempdir().unwrap();
        let coordinator = CacheCoordinator::new(&local_only_config(dir.path()));

        assert!(!coordinator.using_remote());
        // Probe cannot enable a tier that was never configured
        assert!(!coordinator.probe_remote().await);
        assert!(!coordinator.using_remote());
    }

    #[tokio::test]
    async fn test_stats_report_shape() {
        let dir = tempdir().unwrap();
        let coordinator = CacheCoordinator::new(&local_only_config(dir.path()));

        coordinator.set("k", "v".to_string(), None).await;
        coordinator.get("k").await;
        coordinator.get("missing").await;

        let report = coordinator.stats().await;
        assert_eq!(report.hits, 1);
        assert_eq!(report.misses, 1);
        assert_eq!(report.sets, 1);
        assert_eq!(report.local_size, 1);
        assert_eq!(report.capacity, 8);
        assert!(report.fill_percentage > 12.0 && report.fill_percentage < 13.0);
        assert!(!report.using_remote);
        assert_eq!(report.hit_rate, 0.5);
    }

    #[tokio::test]
    async fn test_snapshot_and_restore_across_instances() {
        let dir = tempdir().unwrap();
        let config = local_only_config(dir.path());

        let first = CacheCoordinator::new(&config);
        first.set("persistent", "payload".to_string(), Some(3600)).await;
        first.flush().await;

        let second = CacheCoordinator::new(&config);
        assert_eq!(second.get("persistent").await, Some("payload".to_string()));
    }

    #[tokio::test]
    async fn test_snapshot_after_n_writes() {
        let dir = tempdir().unwrap();
        let mut config = local_only_config(dir.path());
        config.snapshot_every_writes = 3;

        let coordinator = CacheCoordinator::new(&config);
        coordinator.set("a", "1".to_string(), None).await;
        coordinator.set("b", "2".to_string(), None).await;
        assert!(!config.snapshot_path.exists(), "no snapshot before N writes");

        coordinator.set("c", "3".to_string(), None).await;
        assert!(config.snapshot_path.exists(), "snapshot after N writes");
    }

    #[tokio::test]
    async fn test_restore_drops_expired_entries() {
        let dir = tempdir().unwrap();
        let config = local_only_config(dir.path());

        let first = CacheCoordinator::new(&config);
        first.set("stale", "x".to_string(), Some(1)).await;
        first.set("fresh", "y".to_string(), Some(3600)).await;
        first.flush().await;

        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

        let second = CacheCoordinator::new(&config);
        assert_eq!(second.get("stale").await, None);
        assert_eq!(second.get("fresh").await, Some("y".to_string()));
    }
}
