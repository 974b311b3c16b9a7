//! Ambience Library
//!
//! Core functionality of the ambience sound mixer and focus timer:
//! - Track catalog and playback model (single track or mix)
//! - Focus/break timer engine with a one-second tick loop
//! - Saved mixes and shareable mix tokens
//! - Preference persistence with expiry
//! - rodio audio backend and desktop notifications
//! - CLI command parsing, display and interactive session

pub mod catalog;
pub mod cli;
pub mod config;
pub mod mixes;
pub mod notification;
pub mod player;
pub mod session;
pub mod share;
pub mod sound;
pub mod storage;
pub mod timer;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    ActiveTrackRef, BackgroundImage, Category, MixEntry, PlaybackMode, PlaybackState, SavedMix,
    SoundKind, TimerPhase, TimerPreferences, TimerState, Track,
};

pub use catalog::{Catalog, CatalogError};
pub use config::{AppConfig, ConfigError};
pub use mixes::{MixError, MixLibrary};
pub use player::{Player, PlayerError};
pub use session::{Bootstrap, Notice, NoticeLevel, Services, Session, SessionChannels, SessionOptions};
pub use share::SharedMix;
pub use timer::{PhaseCompletion, TickLoop, TimerEngine, TimerError, TimerEvent};

// Re-export collaborator traits and their implementations
pub use notification::{
    DesktopNotifier, MockNotifier, NotificationContent, NotificationError, Notifier, Permission,
};
pub use sound::{
    AudioTransport, ChimePlayer, MockChimePlayer, MockTransport, RodioAudio, SilentAudio,
    SoundError,
};
pub use storage::{
    FileMixStore, FilePreferenceStore, MemoryMixStore, MemoryPreferenceStore, MixStore,
    PreferenceStore, StorageError,
};
