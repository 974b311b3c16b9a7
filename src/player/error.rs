//! Player error types.

use thiserror::Error;

use crate::sound::SoundError;

/// Errors reported by player commands.
///
/// The command has already been applied to the playback state when one of
/// these comes back; only the audio side effect failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlayerError {
    /// A track's audio could not be started.
    #[error("could not play '{track_id}': {source}")]
    Playback {
        track_id: String,
        #[source]
        source: SoundError,
    },
}

impl PlayerError {
    pub(crate) fn playback(track_id: impl Into<String>, source: SoundError) -> Self {
        Self::Playback {
            track_id: track_id.into(),
            source,
        }
    }

    /// Id of the track whose audio failed.
    #[must_use]
    pub fn track_id(&self) -> &str {
        match self {
            Self::Playback { track_id, .. } => track_id,
        }
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Playback { source, .. } => source.suggestion(),
        }
    }
}
