//! Track source resolution.
//!
//! Catalog tracks carry a locator relative to the sounds directory. This
//! module maps locators to files and checks that they stay inside that
//! directory and use a format the decoder understands.

use std::path::{Component, Path, PathBuf};

use super::error::SoundError;
use crate::catalog::Catalog;
use crate::types::Track;

/// Supported audio file extensions.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav", "flac", "m4a"];

/// Returns true if `path` has a supported audio extension.
#[must_use]
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Resolves a track's source locator against `sounds_dir`.
///
/// Absolute locators are used as-is. Relative locators may not climb out of
/// the sounds directory.
///
/// # Errors
///
/// Returns `SoundError::FileNotFound` for a locator escaping `sounds_dir`,
/// and `SoundError::UnsupportedFormat` for an unknown extension.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use ambience::sound::resolve_source;
///
/// let path = resolve_source(Path::new("/srv/sounds"), "rain.mp3").unwrap();
/// assert_eq!(path, Path::new("/srv/sounds/rain.mp3"));
///
/// assert!(resolve_source(Path::new("/srv/sounds"), "../etc/passwd.mp3").is_err());
/// assert!(resolve_source(Path::new("/srv/sounds"), "rain.txt").is_err());
/// ```
pub fn resolve_source(sounds_dir: &Path, locator: &str) -> Result<PathBuf, SoundError> {
    let locator_path = Path::new(locator);

    let path = if locator_path.is_absolute() {
        locator_path.to_path_buf()
    } else {
        let escapes = locator_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(SoundError::FileNotFound(format!(
                "'{}' is outside the sounds directory",
                locator
            )));
        }
        sounds_dir.join(locator_path)
    };

    if !is_supported(&path) {
        return Err(SoundError::UnsupportedFormat(path.display().to_string()));
    }
    Ok(path)
}

/// Returns the catalog tracks whose audio file is missing or unusable.
#[must_use]
pub fn missing_sources<'a>(catalog: &'a Catalog, sounds_dir: &Path) -> Vec<&'a Track> {
    catalog
        .tracks()
        .iter()
        .filter(|track| match resolve_source(sounds_dir, &track.source) {
            Ok(path) => !path.is_file(),
            Err(_) => true,
        })
        .collect()
}
