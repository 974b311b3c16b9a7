//! Saved-mix stores.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::{atomic_write, MixStore, StorageError};
use crate::types::SavedMix;

/// File name of the saved-mix collection inside the data directory.
pub const MIXES_FILE: &str = "mixes.json";

/// In-memory mix store. Clones share the same collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryMixStore {
    mixes: Arc<Mutex<Vec<SavedMix>>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryMixStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `mixes`.
    #[must_use]
    pub fn with_mixes(mixes: Vec<SavedMix>) -> Self {
        Self {
            mixes: Arc::new(Mutex::new(mixes)),
            writes: Arc::default(),
        }
    }

    /// Number of `save_all` calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MixStore for MemoryMixStore {
    fn load_all(&self) -> Vec<SavedMix> {
        self.mixes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn save_all(&self, mixes: &[SavedMix]) -> Result<(), StorageError> {
        *self.mixes.lock().unwrap_or_else(|e| e.into_inner()) = mixes.to_vec();
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

/// Mix store backed by a single JSON array file.
#[derive(Debug, Clone)]
pub struct FileMixStore {
    path: PathBuf,
}

impl FileMixStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses `mixes.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(MIXES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves an unparseable file aside so the next save does not destroy it.
    fn quarantine(&self) {
        let aside = self.path.with_extension("json.corrupt");
        match fs::rename(&self.path, &aside) {
            Ok(()) => warn!("Moved corrupt mix collection to {:?}", aside),
            Err(e) => warn!("Failed to move corrupt mix collection aside: {}", e),
        }
    }
}

impl MixStore for FileMixStore {
    fn load_all(&self) -> Vec<SavedMix> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read saved mixes {:?}: {}", self.path, e);
                return Vec::new();
            }
        };

        let raw: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Ignoring corrupt saved mixes {:?}: {}", self.path, e);
                self.quarantine();
                return Vec::new();
            }
        };

        // A single bad record does not cost the rest of the collection.
        let mixes: Vec<SavedMix> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(mix) => Some(mix),
                Err(e) => {
                    warn!("Skipping malformed saved mix: {}", e);
                    None
                }
            })
            .collect();

        debug!("Loaded {} saved mixes from {:?}", mixes.len(), self.path);
        mixes
    }

    fn save_all(&self, mixes: &[SavedMix]) -> Result<(), StorageError> {
        let contents =
            serde_json::to_string_pretty(mixes).map_err(|source| StorageError::Serialize {
                what: "saved mixes".to_string(),
                source,
            })?;
        atomic_write(&self.path, &contents)?;
        debug!("Wrote {} saved mixes to {:?}", mixes.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MixEntry;

    fn sample(name: &str) -> SavedMix {
        SavedMix::new(name, vec![MixEntry::new("rain", 0.4)], None)
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryMixStore::new();
        assert!(store.load_all().is_empty());

        store.save_all(&[sample("A"), sample("B")]).unwrap();
        let loaded = store.load_all();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].name, "B");
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_file_store_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMixStore::in_dir(dir.path());
        assert!(store.load_all().is_empty());
    }

    #[test]
    fn test_file_store_rewrites_whole_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMixStore::in_dir(dir.path());

        store.save_all(&[sample("A"), sample("B")]).unwrap();
        store.save_all(&[sample("C")]).unwrap();

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "C");
    }

    #[test]
    fn test_file_store_skips_bad_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMixStore::in_dir(dir.path());
        let good = serde_json::to_value(sample("Good")).unwrap();
        let content = serde_json::to_string(&vec![good, serde_json::json!({"id": 7})]).unwrap();
        fs::write(store.path(), content).unwrap();

        let loaded = store.load_all();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Good");
    }

    #[test]
    fn test_file_store_quarantines_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMixStore::in_dir(dir.path());
        fs::write(store.path(), "not json").unwrap();

        assert!(store.load_all().is_empty());
        assert!(!store.path().exists());
        assert!(store.path().with_extension("json.corrupt").exists());
    }
}
