//! Storage error types.
//!
//! Reads never surface these: a missing or corrupt value falls back to its
//! default. Only writes report failures, and callers log them.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while persisting preferences or saved mixes.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing a file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized.
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// No data directory could be determined for this platform.
    #[error("no data directory available")]
    NoDataDir,
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::Io { .. } => "Check that the data directory is writable",
            Self::Serialize { .. } => "This is a bug; please report it",
            Self::NoDataDir => "Pass --data-dir to choose where to store data",
        }
    }
}
