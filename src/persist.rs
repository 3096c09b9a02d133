//! Persistence Module
//!
//! Atomic snapshot save/load for the local store. Snapshots are written
//! to a temporary file in the same directory and renamed into place, so
//! a crash mid-write never corrupts the previous snapshot. An unreadable
//! snapshot is discarded with a warning rather than failing startup.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::CacheEntry;
use crate::error::{PersistError, PersistResult};

/// Current on-disk snapshot format version.
const SNAPSHOT_VERSION: u8 = 1;

// == Snapshot File ==
/// Versioned on-disk representation of the local store.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    /// Format version; readers reject versions they do not understand
    version: u8,
    /// When the snapshot was taken
    saved_at: DateTime<Utc>,
    /// Entry count, recorded for operability
    entry_count: usize,
    /// The persisted entries
    entries: HashMap<String, CacheEntry>,
}

// == Persistence Manager ==
/// Saves and loads local store snapshots at a fixed path.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    /// Snapshot file location
    path: PathBuf,
}

impl PersistenceManager {
    // == Constructor ==
    /// Creates a manager persisting to the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // == Save ==
    /// Atomically writes the full entry map to the snapshot file.
    ///
    /// Write-to-temporary-then-rename: the previous snapshot stays intact
    /// until the new one is fully on disk.
    pub fn save(&self, entries: &HashMap<String, CacheEntry>) -> PersistResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            entry_count: entries.len(),
            entries: entries.clone(),
        };
        let data = serde_json::to_vec(&snapshot)?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &data)?;
        fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            entries = snapshot.entry_count,
            "Snapshot saved"
        );
        Ok(())
    }

    // == Load ==
    /// Reads the snapshot, returning an empty map on any failure.
    ///
    /// A missing file is the normal first-run case and is not logged; a
    /// corrupt or version-incompatible file is logged as a warning and
    /// discarded so startup always succeeds.
    pub fn load(&self) -> HashMap<String, CacheEntry> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(PersistError::Io(e)) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Snapshot unreadable, starting from an empty store"
                );
                HashMap::new()
            }
        }
    }

    /// Strict load used internally and by tests.
    fn try_load(&self) -> PersistResult<HashMap<String, CacheEntry>> {
        let data = fs::read(&self.path)?;
        let snapshot: Snapshot = serde_json::from_slice(&data)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistError::UnsupportedVersion(snapshot.version));
        }
        Ok(snapshot.entries)
    }
}
