//! Persistence adapters.
//!
//! Two independent tiers:
//!
//! - [`PreferenceStore`]: small scalar values with an optional time-to-live,
//!   used for session continuity (last track, volume, mode, background).
//! - [`MixStore`]: the whole saved-mix collection, read and rewritten as a unit.
//!
//! Absence and corruption are never errors on read; callers fall back to
//! defaults. File-backed and in-memory implementations are provided for both.

mod error;
mod mixes;
mod prefs;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::types::SavedMix;

pub use error::StorageError;
pub use mixes::{FileMixStore, MemoryMixStore, MIXES_FILE};
pub use prefs::{FilePreferenceStore, MemoryPreferenceStore, PreferenceEntry, PREFERENCES_FILE};

/// Lifetime of the session-continuity preferences.
pub const PREFERENCE_TTL_DAYS: u32 = 30;

/// Keys used in the preference store.
pub mod keys {
    pub const CURRENT_TRACK: &str = "current_track";
    pub const MASTER_VOLUME: &str = "master_volume";
    pub const IS_PLAYING: &str = "is_playing";
    pub const MIX_MODE: &str = "mix_mode";
    pub const ACTIVE_TRACKS: &str = "active_tracks";
    pub const TRACK_VOLUMES: &str = "track_volumes";
    pub const BACKGROUND: &str = "background";
    pub const FOLLOW_CURRENT_TRACK: &str = "follow_current_track";
    pub const TIMER_PREFERENCES: &str = "timer_preferences";
}

/// Key-value store for scalar preferences.
pub trait PreferenceStore {
    /// Returns the value for `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores a value. `ttl_days` of `None` never expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: &str, ttl_days: Option<u32>) -> Result<(), StorageError>;

    /// Removes a value. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the change cannot be persisted.
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Whole-collection store for saved mixes.
pub trait MixStore {
    /// Loads every saved mix. Unreadable data yields an empty list.
    fn load_all(&self) -> Vec<SavedMix>;

    /// Replaces the stored collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection cannot be written.
    fn save_all(&self, mixes: &[SavedMix]) -> Result<(), StorageError>;
}

/// Reads a JSON value from the preference store.
///
/// A value that fails to parse is deleted and treated as absent.
pub fn read_json<T: DeserializeOwned>(store: &dyn PreferenceStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding corrupt preference '{}': {}", key, e);
            if let Err(e) = store.delete(key) {
                warn!("Failed to delete corrupt preference '{}': {}", key, e);
            }
            None
        }
    }
}

/// Writes a JSON value to the preference store.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn PreferenceStore,
    key: &str,
    value: &T,
    ttl_days: Option<u32>,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        what: key.to_string(),
        source,
    })?;
    store.set(key, &raw, ttl_days)
}

/// Writes `contents` to `path` through a temporary sibling file and a rename.
pub(crate) fn atomic_write(path: &Path, contents: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(|e| StorageError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| StorageError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_write_json() {
        let store = MemoryPreferenceStore::new();
        write_json(&store, keys::MASTER_VOLUME, &0.75f32, Some(PREFERENCE_TTL_DAYS)).unwrap();

        let volume: Option<f32> = read_json(&store, keys::MASTER_VOLUME);
        assert_eq!(volume, Some(0.75));
    }

    #[test]
    fn test_read_json_absent() {
        let store = MemoryPreferenceStore::new();
        let value: Option<bool> = read_json(&store, keys::IS_PLAYING);
        assert_eq!(value, None);
    }

    #[test]
    fn test_read_json_discards_corrupt_value() {
        let store = MemoryPreferenceStore::new();
        store.set(keys::ACTIVE_TRACKS, "[\"rain\",", None).unwrap();

        let value: Option<Vec<String>> = read_json(&store, keys::ACTIVE_TRACKS);

        assert_eq!(value, None);
        assert_eq!(store.get(keys::ACTIVE_TRACKS), None);
    }

    #[test]
    fn test_read_json_wrong_type() {
        let store = MemoryPreferenceStore::new();
        store.set(keys::MASTER_VOLUME, "\"loud\"", None).unwrap();

        let value: Option<f32> = read_json(&store, keys::MASTER_VOLUME);
        assert_eq!(value, None);
    }

    #[test]
    fn test_atomic_write_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");

        atomic_write(&path, "[]").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
        assert!(!path.with_extension("json.tmp").exists());
    }
}
