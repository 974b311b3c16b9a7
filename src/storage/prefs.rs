//! Scalar preference stores.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{atomic_write, PreferenceStore, StorageError};

/// File name of the preference store inside the data directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

/// A stored value with its optional expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl PreferenceEntry {
    /// Creates an entry expiring `ttl_days` after `now`.
    pub fn new(value: impl Into<String>, ttl_days: Option<u32>, now: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at: ttl_days.map(|days| now + Duration::days(i64::from(days))),
        }
    }

    /// Returns true if the entry has expired at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

type Entries = HashMap<String, PreferenceEntry>;

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    // A poisoned map is still a valid map.
    entries.lock().unwrap_or_else(|e| e.into_inner())
}

fn live_value(entries: &Entries, key: &str, now: DateTime<Utc>) -> Option<String> {
    entries
        .get(key)
        .filter(|entry| !entry.is_expired(now))
        .map(|entry| entry.value.clone())
}

// ============================================================================
// MemoryPreferenceStore
// ============================================================================

/// In-memory preference store.
///
/// Clones share the same entries, so a test can keep a handle to a store it
/// gave away.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceStore {
    entries: Arc<Mutex<Entries>>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw entry, e.g. one that has already expired.
    pub fn insert_entry(&self, key: impl Into<String>, entry: PreferenceEntry) {
        lock(&self.entries).insert(key.into(), entry);
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        live_value(&lock(&self.entries), key, Utc::now())
    }

    fn set(&self, key: &str, value: &str, ttl_days: Option<u32>) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), PreferenceEntry::new(value, ttl_days, Utc::now()));
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

// ============================================================================
// FilePreferenceStore
// ============================================================================

/// Preference store backed by a JSON file.
///
/// The file is read once when the store is opened; every change rewrites it.
#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FilePreferenceStore {
    /// Opens the store at `path`.
    ///
    /// A missing file starts empty. A corrupt file is ignored and will be
    /// replaced on the next write. Expired entries are dropped on open.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut entries = read_entries(&path);
        let now = Utc::now();
        entries.retain(|_, entry| !entry.is_expired(now));

        debug!("Opened preference store {:?} ({} entries)", path, entries.len());
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    /// Opens `preferences.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::open(dir.join(PREFERENCES_FILE))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &Entries) -> Result<(), StorageError> {
        let contents =
            serde_json::to_string_pretty(entries).map_err(|source| StorageError::Serialize {
                what: "preferences".to_string(),
                source,
            })?;
        atomic_write(&self.path, &contents)
    }
}

fn read_entries(path: &Path) -> Entries {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Entries::new(),
        Err(e) => {
            warn!("Failed to read preferences {:?}: {}", path, e);
            return Entries::new();
        }
    };

    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!("Ignoring corrupt preferences {:?}: {}", path, e);
        Entries::new()
    })
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        live_value(&lock(&self.entries), key, Utc::now())
    }

    fn set(&self, key: &str, value: &str, ttl_days: Option<u32>) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        entries.insert(key.to_string(), PreferenceEntry::new(value, ttl_days, Utc::now()));
        self.flush(&entries)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = lock(&self.entries);
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&entries)
    }
}
