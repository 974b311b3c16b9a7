//! Sound system error types.
//!
//! Every error here is recoverable: a track that fails to start is reported
//! to the user while the playback state stays as already applied.

use thiserror::Error;

/// Errors that can occur in the sound playback system.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoundError {
    /// Audio device is not available (e.g., no speakers connected).
    #[error("audio device not available: {0}")]
    DeviceNotAvailable(String),

    /// Sound file was not found at the specified path.
    #[error("sound file not found: {0}")]
    FileNotFound(String),

    /// The track's source has an extension no decoder handles.
    #[error("unsupported sound format: {0}")]
    UnsupportedFormat(String),

    /// Failed to decode the audio file.
    #[error("failed to decode sound file: {0}")]
    DecodeError(String),

    /// Failed to create the audio output stream.
    #[error("failed to create audio stream: {0}")]
    StreamError(String),

    /// No output was created for this track at startup.
    #[error("no audio output for track '{0}'")]
    UnknownTrack(String),

    /// Generic sound playback error.
    #[error("sound playback error: {0}")]
    PlaybackError(String),
}

impl SoundError {
    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::DeviceNotAvailable(_) => "Connect an audio output device",
            Self::FileNotFound(_) => "Check the sounds directory in the configuration",
            Self::UnsupportedFormat(_) => "Use mp3, ogg, wav or flac files",
            Self::DecodeError(_) => "The sound file may be corrupted",
            Self::StreamError(_) => "Check your audio settings",
            Self::UnknownTrack(_) => "Restart the application after changing the catalog",
            Self::PlaybackError(_) => "Restart the application",
        }
    }
}
