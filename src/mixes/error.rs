//! Saved-mix error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by saved-mix operations.
#[derive(Debug, Error)]
pub enum MixError {
    /// Nothing is active, so there is nothing to save.
    #[error("no active tracks to save")]
    EmptyMix,

    /// No saved mix has this id.
    #[error("no saved mix with id '{0}'")]
    UnknownMix(String),

    /// The configured share base is not an absolute URL.
    #[error("invalid share base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The collection could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl MixError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::EmptyMix => "Add at least one track before saving",
            Self::UnknownMix(_) => "Run 'ambience mixes list' to see saved mixes",
            Self::InvalidBaseUrl(_) => "Set share_base_url in the config to an absolute http(s) URL",
            Self::Storage(e) => e.suggestion(),
        }
    }
}
