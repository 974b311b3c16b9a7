//! Sound playback system.
//!
//! This module provides the audio side effects of the player:
//!
//! - One looping output per catalog track, commanded by the player only
//! - Synthesized completion chimes for the timer (beep, bell)
//! - Track source resolution against the sounds directory
//! - Graceful degradation when audio is unavailable
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │      Player      │──────▶ │  AudioTransport  │ play / pause / stop / volume
//! └──────────────────┘        └────────┬─────────┘
//! ┌──────────────────┐        ┌────────┴─────────┐
//! │     Session      │──────▶ │   ChimePlayer    │ phase-end chimes
//! └──────────────────┘        └────────┬─────────┘
//!                                      ▼
//!                             ┌──────────────────┐
//!                             │    RodioAudio    │ (or the mocks in tests)
//!                             └──────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use ambience::catalog;
//! use ambience::sound::{AudioTransport, ChimePlayer, RodioAudio};
//! use ambience::types::SoundKind;
//!
//! let catalog = catalog::builtin();
//! let audio = RodioAudio::new(&catalog, "/usr/share/ambience/sounds").expect("audio init");
//!
//! audio.play(catalog.track("rain").unwrap(), 0.5).expect("playback failed");
//! audio.play_chime(SoundKind::Bell).expect("chime failed");
//! ```

mod backend;
mod chime;
mod error;
mod source;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub use backend::RodioAudio;
pub use chime::{length as chime_length, tones as chime_tones, Tone};
pub use error::SoundError;
pub use source::{is_supported, missing_sources, resolve_source, SUPPORTED_EXTENSIONS};

use crate::types::{clamp_volume, SoundKind, Track};

/// Per-track audio outputs.
///
/// Starting a track is the only fallible operation; pausing, stopping and
/// volume changes on an unknown track are ignored.
pub trait AudioTransport {
    /// Starts (or resumes) the track's loop at `volume`.
    ///
    /// # Errors
    ///
    /// Returns an error if the track's audio cannot be started.
    fn play(&self, track: &Track, volume: f32) -> Result<(), SoundError>;

    /// Pauses the track, keeping its position.
    fn pause(&self, track_id: &str);

    /// Stops the track and releases its queued audio.
    fn stop(&self, track_id: &str);

    /// Changes the track's output volume.
    fn set_volume(&self, track_id: &str, volume: f32);

    /// Stops every output.
    fn stop_all(&self);
}

/// Plays timer completion chimes.
pub trait ChimePlayer {
    /// Plays the chime without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if playback fails.
    fn play_chime(&self, kind: SoundKind) -> Result<(), SoundError>;
}

/// Transport that does nothing, for running without an audio device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioTransport for SilentAudio {
    fn play(&self, _track: &Track, _volume: f32) -> Result<(), SoundError> {
        Ok(())
    }

    fn pause(&self, _track_id: &str) {}

    fn stop(&self, _track_id: &str) {}

    fn set_volume(&self, _track_id: &str, _volume: f32) {}

    fn stop_all(&self) {}
}

impl ChimePlayer for SilentAudio {
    fn play_chime(&self, _kind: SoundKind) -> Result<(), SoundError> {
        Ok(())
    }
}

// ============================================================================
// Mocks
// ============================================================================

/// A recorded transport command.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Play { track_id: String, volume: f32 },
    Pause(String),
    Stop(String),
    SetVolume { track_id: String, volume: f32 },
    StopAll,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct MockOutput {
    playing: bool,
    volume: f32,
}

/// Mock transport for testing.
///
/// Tracks per-output playing/volume state and records every call.
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    outputs: Mutex<HashMap<String, MockOutput>>,
    failing: Mutex<HashSet<String>>,
    should_fail: AtomicBool,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `play` call fail.
    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Makes `play` fail for one track.
    pub fn fail_track(&self, track_id: &str) {
        self.failing.lock().unwrap().insert(track_id.to_string());
    }

    /// Returns true if the track's output is currently playing.
    #[must_use]
    pub fn is_playing(&self, track_id: &str) -> bool {
        self.outputs
            .lock()
            .unwrap()
            .get(track_id)
            .is_some_and(|o| o.playing)
    }

    /// Ids of all playing outputs, sorted.
    #[must_use]
    pub fn playing_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .outputs
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, o)| o.playing)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Last volume applied to the track's output.
    #[must_use]
    pub fn volume(&self, track_id: &str) -> Option<f32> {
        self.outputs.lock().unwrap().get(track_id).map(|o| o.volume)
    }

    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AudioTransport for MockTransport {
    fn play(&self, track: &Track, volume: f32) -> Result<(), SoundError> {
        let volume = clamp_volume(volume);
        self.record(TransportCall::Play {
            track_id: track.id.clone(),
            volume,
        });
        if self.should_fail.load(Ordering::SeqCst) || self.failing.lock().unwrap().contains(&track.id)
        {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        self.outputs.lock().unwrap().insert(
            track.id.clone(),
            MockOutput {
                playing: true,
                volume,
            },
        );
        Ok(())
    }

    fn pause(&self, track_id: &str) {
        self.record(TransportCall::Pause(track_id.to_string()));
        if let Some(output) = self.outputs.lock().unwrap().get_mut(track_id) {
            output.playing = false;
        }
    }

    fn stop(&self, track_id: &str) {
        self.record(TransportCall::Stop(track_id.to_string()));
        if let Some(output) = self.outputs.lock().unwrap().get_mut(track_id) {
            output.playing = false;
        }
    }

    fn set_volume(&self, track_id: &str, volume: f32) {
        let volume = clamp_volume(volume);
        self.record(TransportCall::SetVolume {
            track_id: track_id.to_string(),
            volume,
        });
        self.outputs
            .lock()
            .unwrap()
            .entry(track_id.to_string())
            .or_default()
            .volume = volume;
    }

    fn stop_all(&self) {
        self.record(TransportCall::StopAll);
        for output in self.outputs.lock().unwrap().values_mut() {
            output.playing = false;
        }
    }
}

/// Mock chime player for testing.
#[derive(Debug, Default)]
pub struct MockChimePlayer {
    play_calls: Mutex<Vec<SoundKind>>,
    should_fail: AtomicBool,
}

impl MockChimePlayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn play_count(&self) -> usize {
        self.play_calls.lock().unwrap().len()
    }

    #[must_use]
    pub fn get_play_calls(&self) -> Vec<SoundKind> {
        self.play_calls.lock().unwrap().clone()
    }
}

impl ChimePlayer for MockChimePlayer {
    fn play_chime(&self, kind: SoundKind) -> Result<(), SoundError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(SoundError::PlaybackError("Mock failure".to_string()));
        }
        self.play_calls.lock().unwrap().push(kind);
        Ok(())
    }
}
