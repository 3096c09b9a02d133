//! Remote Store Module
//!
//! Adapter to the shared Redis backend. Keys are namespaced under a fixed
//! prefix; values travel as a versioned JSON envelope so entries written
//! by one process version stay readable by another. Every operation is a
//! network call bounded by an explicit timeout, and every failure is
//! reported as a [`RemoteError`] for the coordinator to absorb.

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::CacheEntry;
use crate::error::{RemoteError, RemoteResult};

/// Current wire envelope version.
const ENVELOPE_VERSION: u8 = 1;

/// Keys scanned per SCAN round trip.
const SCAN_BATCH: usize = 100;

// == Remote Envelope ==
/// Versioned wire representation of a cached value.
///
/// Language-neutral JSON: any client that speaks the backend can read and
/// write entries, unlike a runtime-specific binary encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEnvelope {
    /// Envelope format version
    pub version: u8,
    /// The cached response payload
    pub value: String,
    /// Original creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// TTL in seconds relative to `created_at`
    pub ttl_secs: Option<u64>,
}

impl RemoteEnvelope {
    /// Builds an envelope from a local entry.
    pub fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            value: entry.value.clone(),
            created_at: entry.created_at,
            ttl_secs: entry.ttl_secs,
        }
    }

    /// Converts a received envelope back into a local entry.
    ///
    /// `created_at` and TTL are carried over unchanged so expiry stays
    /// relative to the original write, not the backfill.
    pub fn into_entry(self) -> CacheEntry {
        CacheEntry {
            value: self.value,
            created_at: self.created_at,
            last_accessed: current_timestamp_ms(),
            ttl_secs: self.ttl_secs,
        }
    }

    /// Serializes the envelope for the wire.
    pub fn encode(&self) -> RemoteResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes an envelope, rejecting unknown versions.
    pub fn decode(payload: &str) -> RemoteResult<Self> {
        let envelope: Self = serde_json::from_str(payload)?;
        if envelope.version != ENVELOPE_VERSION {
            return Err(RemoteError::UnsupportedVersion(envelope.version));
        }
        Ok(envelope)
    }
}

// == Remote Store ==
/// Redis-backed distributed cache tier.
///
/// The connection is established lazily and kept in a managed handle that
/// reconnects on its own; a backend that is down at startup can still be
/// reached later once the reconnect probe succeeds.
pub struct RemoteStore {
    /// Parsed endpoint; no I/O happens until the first operation
    client: Client,
    /// Lazily established managed connection
    conn: Mutex<Option<ConnectionManager>>,
    /// Namespace prefix for every key in the shared backend
    prefix: String,
    /// Per-operation timeout in milliseconds
    timeout_ms: u64,
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("prefix", &self.prefix)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl RemoteStore {
    // == Constructor ==
    /// Creates a store for the given endpoint.
    ///
    /// Fails only on an unparsable URL; connecting is deferred to the
    /// first operation.
    pub fn new(url: &str, namespace: &str, timeout_ms: u64) -> RemoteResult<Self> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            prefix: namespace.to_string(),
            timeout_ms,
        })
    }

    // == Get ==
    /// Reads an entry, or None if the backend has no live value.
    pub async fn get(&self, key: &str) -> RemoteResult<Option<CacheEntry>> {
        let mut conn = self.manager().await?;
        let nskey = self.namespaced(key);
        let payload: Option<String> = self
            .bounded(redis::cmd("GET").arg(&nskey).query_async(&mut conn))
            .await?;
        match payload {
            Some(raw) => Ok(Some(RemoteEnvelope::decode(&raw)?.into_entry())),
            None => Ok(None),
        }
    }

    // == Set ==
    /// Writes an entry under the namespace.
    ///
    /// The remaining TTL is also applied as the backend's native per-key
    /// expiry, a second line of defense against stale reads by clients
    /// that skip the envelope check.
    pub async fn set(&self, key: &str, entry: &CacheEntry) -> RemoteResult<()> {
        let payload = RemoteEnvelope::from_entry(entry).encode()?;
        let mut conn = self.manager().await?;
        let nskey = self.namespaced(key);

        let mut cmd = redis::cmd("SET");
        cmd.arg(&nskey).arg(&payload);
        if let Some(remaining_ms) = entry.ttl_remaining_ms() {
            // Round up so an entry is never expired early by the backend
            let remaining_secs = (remaining_ms + 999) / 1000;
            cmd.arg("EX").arg(remaining_secs.max(1));
        }

        let _: () = self.bounded(cmd.query_async(&mut conn)).await?;
        Ok(())
    }

    // == Remove ==
    /// Deletes a key, returning whether it existed.
    pub async fn remove(&self, key: &str) -> RemoteResult<bool> {
        let mut conn = self.manager().await?;
        let nskey = self.namespaced(key);
        let deleted: i64 = self
            .bounded(redis::cmd("DEL").arg(&nskey).query_async(&mut conn))
            .await?;
        Ok(deleted > 0)
    }

    // == Clear ==
    /// Deletes every key under the namespace, returning the count removed.
    pub async fn clear(&self) -> RemoteResult<usize> {
        self.clear_matching(|_| true).await
    }

    // == Clear Matching ==
    /// Deletes namespaced keys whose un-prefixed form satisfies the
    /// predicate. Returns the count removed.
    pub async fn clear_matching<F>(&self, pred: F) -> RemoteResult<usize>
    where
        F: Fn(&str) -> bool,
    {
        let mut conn = self.manager().await?;
        let strip = format!("{}:", self.prefix);
        let mut removed = 0usize;

        for nskey in self.scan_namespace(&mut conn).await? {
            let bare = nskey.strip_prefix(&strip).unwrap_or(&nskey);
            if pred(bare) {
                let deleted: i64 = self
                    .bounded(redis::cmd("DEL").arg(&nskey).query_async(&mut conn))
                    .await?;
                removed += deleted as usize;
            }
        }

        debug!(removed, "Remote clear finished");
        Ok(removed)
    }

    // == Ping ==
    /// Round-trips a PING; used by the reconnect probe.
    pub async fn ping(&self) -> RemoteResult<()> {
        let mut conn = self.manager().await?;
        let _: String = self
            .bounded(redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }

    // == Internal ==
    /// Full namespaced form of a cache key.
    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Returns a usable connection handle, establishing one if needed.
    ///
    /// The lock guards only establishment; commands run on a clone so the
    /// lock is never held across an arbitrary network call.
    async fn manager(&self) -> RemoteResult<ConnectionManager> {
        let mut guard = self.conn.lock().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }
        let manager = self
            .bounded(ConnectionManager::new(self.client.clone()))
            .await?;
        *guard = Some(manager.clone());
        debug!(prefix = %self.prefix, "Remote store connected");
        Ok(manager)
    }

    /// Cursor-based SCAN over the namespace.
    async fn scan_namespace(&self, conn: &mut ConnectionManager) -> RemoteResult<Vec<String>> {
        let pattern = format!("{}:*", self.prefix);
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, batch): (u64, Vec<String>) = self
                .bounded(
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(conn),
                )
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(keys)
    }

    /// Applies the per-operation timeout to a Redis call or to
    /// connection establishment.
    async fn bounded<T, F>(&self, fut: F) -> RemoteResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(Duration::from_millis(self.timeout_ms), fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RemoteError::Timeout(self.timeout_ms)),
        }
    }
}
