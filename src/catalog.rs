//! Track and background catalog.
//!
//! The catalog is loaded once at startup, either from the built-in list or
//! from a JSON file, and is never mutated afterwards.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{BackgroundImage, Category, Track};

/// Errors raised while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog contains no tracks")]
    Empty,
}

/// Immutable collection of tracks and background images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    tracks: Vec<Track>,
    #[serde(default)]
    backgrounds: Vec<BackgroundImage>,
}

impl Catalog {
    /// Builds a catalog, dropping entries whose id was already seen.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` if no tracks remain.
    pub fn new(
        tracks: Vec<Track>,
        backgrounds: Vec<BackgroundImage>,
    ) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let tracks: Vec<Track> = tracks
            .into_iter()
            .filter(|t| {
                let fresh = seen.insert(t.id.clone());
                if !fresh {
                    warn!("Duplicate track id '{}' in catalog, keeping the first", t.id);
                }
                fresh
            })
            .collect();

        let mut seen = HashSet::new();
        let backgrounds = backgrounds
            .into_iter()
            .filter(|b| {
                let fresh = seen.insert(b.id.clone());
                if !fresh {
                    warn!("Duplicate background id '{}' in catalog, keeping the first", b.id);
                }
                fresh
            })
            .collect();

        if tracks.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self {
            tracks,
            backgrounds,
        })
    }

    /// Loads a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds no tracks.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let raw: Catalog = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        debug!(
            "Loaded catalog from {:?}: {} tracks, {} backgrounds",
            path,
            raw.tracks.len(),
            raw.backgrounds.len()
        );
        Self::new(raw.tracks, raw.backgrounds)
    }

    /// All tracks in catalog order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// All selectable background images.
    pub fn backgrounds(&self) -> &[BackgroundImage] {
        &self.backgrounds
    }

    /// Looks up a track by id.
    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Returns true if the catalog has a track with this id.
    pub fn contains(&self, id: &str) -> bool {
        self.track(id).is_some()
    }

    /// The first track, used when resuming from an empty state.
    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    /// Tracks of one category.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.category == category)
    }

    /// Looks up a background image by id.
    pub fn background(&self, id: &str) -> Option<&BackgroundImage> {
        self.backgrounds.iter().find(|b| b.id == id)
    }

    /// The background shown before the user picks one.
    pub fn default_background(&self) -> Option<&BackgroundImage> {
        self.backgrounds.first()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        builtin()
    }
}

/// The catalog shipped with the application.
pub fn builtin() -> Catalog {
    let t = |id: &str, name: &str, category: Category, icon: &str| {
        Track::new(id, name, category, icon, format!("{id}.mp3"))
            .with_thumbnail(format!("thumbnails/{id}.jpg"))
    };

    let tracks = vec![
        t("rain", "Rain", Category::Rain, "cloud-rain").with_background("backgrounds/rain.jpg"),
        t("thunder", "Thunder", Category::Rain, "cloud-lightning"),
        t("rain-on-window", "Rain on Window", Category::Rain, "droplets")
            .with_background("backgrounds/window.jpg"),
        t("forest", "Forest", Category::Nature, "trees").with_background("backgrounds/forest.jpg"),
        t("waves", "Waves", Category::Nature, "waves").with_background("backgrounds/ocean.jpg"),
        t("river", "River", Category::Nature, "waves"),
        t("wind", "Wind", Category::Nature, "wind"),
        t("campfire", "Campfire", Category::Nature, "flame")
            .with_background("backgrounds/campfire.jpg"),
        t("birds", "Birds", Category::Animals, "bird"),
        t("crickets", "Crickets", Category::Animals, "bug"),
        t("cafe", "Cafe", Category::Places, "coffee").with_background("backgrounds/cafe.jpg"),
        t("library", "Library", Category::Places, "library"),
        t("city", "City Traffic", Category::Urban, "building"),
        t("train", "Train", Category::Transport, "train-front"),
        t("clock", "Clock", Category::Things, "clock"),
        t("keyboard", "Keyboard", Category::Things, "keyboard"),
        t("white-noise", "White Noise", Category::Noise, "audio-lines"),
        t("brown-noise", "Brown Noise", Category::Noise, "audio-waveform"),
    ];

    let backgrounds = vec![
        BackgroundImage::new("mountains", "Mountains", "backgrounds/mountains.jpg"),
        BackgroundImage::new("forest", "Forest", "backgrounds/forest.jpg"),
        BackgroundImage::new("ocean", "Ocean", "backgrounds/ocean.jpg"),
        BackgroundImage::new("night", "Night Sky", "backgrounds/night.jpg"),
    ];

    Catalog {
        tracks,
        backgrounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let catalog = builtin();
        assert!(!catalog.tracks().is_empty());
        assert_eq!(catalog.first().map(|t| t.id.as_str()), Some("rain"));
        assert_eq!(catalog.default_background().map(|b| b.id.as_str()), Some("mountains"));
        assert!(catalog.contains("campfire"));
        assert!(!catalog.contains("spaceship"));
    }

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = builtin();
        let ids: HashSet<_> = catalog.tracks().iter().map(|t| &t.id).collect();
        assert_eq!(ids.len(), catalog.tracks().len());
    }

    #[test]
    fn test_every_category_is_used() {
        let catalog = builtin();
        for category in Category::ALL {
            assert!(
                catalog.by_category(category).next().is_some(),
                "no track in {}",
                category.as_str()
            );
        }
    }

    #[test]
    fn test_new_drops_duplicates() {
        let tracks = vec![
            Track::new("a", "A", Category::Noise, "x", "a.mp3"),
            Track::new("a", "A again", Category::Noise, "x", "a2.mp3"),
        ];
        let catalog = Catalog::new(tracks, Vec::new()).unwrap();
        assert_eq!(catalog.tracks().len(), 1);
        assert_eq!(catalog.track("a").unwrap().name, "A");
    }

    #[test]
    fn test_new_rejects_empty() {
        let result = Catalog::new(Vec::new(), Vec::new());
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"{"tracks":[{"id":"hum","name":"Hum","category":"noise","icon":"zap","source":"hum.ogg"}]}"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.tracks().len(), 1);
        assert!(catalog.backgrounds().is_empty());
        assert_eq!(catalog.track("hum").unwrap().background, None);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(Catalog::load(&path), Err(CatalogError::Parse { .. })));
        assert!(matches!(
            Catalog::load(&dir.path().join("missing.json")),
            Err(CatalogError::Read { .. })
        ));
    }
}
