//! Saved mixes.
//!
//! `MixLibrary` keeps the saved-mix collection in memory and writes the
//! whole collection back to its [`MixStore`] after every change.

mod error;

use std::sync::Arc;

use tracing::{debug, info};

pub use error::MixError;

use crate::share::{self, SharedMix};
use crate::storage::MixStore;
use crate::types::{ActiveTrackRef, MixEntry, SavedMix};

/// The saved-mix collection.
pub struct MixLibrary {
    store: Arc<dyn MixStore>,
    mixes: Vec<SavedMix>,
}

impl MixLibrary {
    /// Loads the collection from `store`.
    pub fn load(store: Arc<dyn MixStore>) -> Self {
        let mixes = store.load_all();
        debug!("Mix library holds {} mixes", mixes.len());
        Self { store, mixes }
    }

    /// Saved mixes in creation order.
    pub fn list(&self) -> &[SavedMix] {
        &self.mixes
    }

    pub fn len(&self) -> usize {
        self.mixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SavedMix> {
        self.mixes.iter().find(|m| m.id == id)
    }

    /// Looks a mix up by exact id, unique id prefix, or exact name.
    pub fn find(&self, query: &str) -> Option<&SavedMix> {
        if let Some(mix) = self.get(query) {
            return Some(mix);
        }

        let mut by_prefix = self.mixes.iter().filter(|m| m.id.starts_with(query));
        if let (Some(mix), None) = (by_prefix.next(), by_prefix.next()) {
            if !query.is_empty() {
                return Some(mix);
            }
        }

        self.mixes.iter().find(|m| m.name == query)
    }

    /// Saves a snapshot of the active tracks.
    ///
    /// A blank name becomes `Mix {n+1}`.
    ///
    /// # Errors
    ///
    /// Returns `MixError::EmptyMix` if no tracks are active, or a storage
    /// error if the collection cannot be written; the library is unchanged
    /// in both cases.
    pub fn save(
        &mut self,
        name: Option<&str>,
        tracks: &[ActiveTrackRef],
        background: Option<String>,
    ) -> Result<SavedMix, MixError> {
        if tracks.is_empty() {
            return Err(MixError::EmptyMix);
        }

        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Mix {}", self.mixes.len() + 1),
        };
        let entries = tracks.iter().map(MixEntry::from).collect();
        let mix = SavedMix::new(name, entries, background);

        self.mixes.push(mix.clone());
        if let Err(e) = self.store.save_all(&self.mixes) {
            self.mixes.pop();
            return Err(e.into());
        }

        info!("Saved mix '{}' ({})", mix.name, mix.id);
        Ok(mix)
    }

    /// Deletes a mix. Deleting an absent id changes nothing.
    ///
    /// Returns true if a mix was removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the collection cannot be written; the
    /// mix stays in the library in that case.
    pub fn delete(&mut self, id: &str) -> Result<bool, MixError> {
        let Some(index) = self.mixes.iter().position(|m| m.id == id) else {
            debug!("Delete of absent mix '{}' ignored", id);
            return Ok(false);
        };

        let removed = self.mixes.remove(index);
        if let Err(e) = self.store.save_all(&self.mixes) {
            self.mixes.insert(index, removed);
            return Err(e.into());
        }

        info!("Deleted mix '{}'", removed.name);
        Ok(true)
    }

    /// Encodes a saved mix into a share token. Shared mixes autoplay.
    ///
    /// # Errors
    ///
    /// Returns `MixError::UnknownMix` if no mix has this id.
    pub fn share_token(&self, id: &str) -> Result<String, MixError> {
        let mix = self
            .get(id)
            .ok_or_else(|| MixError::UnknownMix(id.to_string()))?;
        Ok(share::encode(&SharedMix::from_saved(mix, true)))
    }

    /// Builds the share URL of a saved mix.
    ///
    /// # Errors
    ///
    /// Returns `MixError::UnknownMix` if no mix has this id, or
    /// `MixError::InvalidBaseUrl` if `base_url` is not an absolute URL.
    pub fn share_url(&self, id: &str, base_url: &str) -> Result<String, MixError> {
        let token = self.share_token(id)?;
        Ok(share::share_url(base_url, &token)?)
    }
}

impl std::fmt::Debug for MixLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixLibrary")
            .field("mixes", &self.mixes.len())
            .finish_non_exhaustive()
    }
}
