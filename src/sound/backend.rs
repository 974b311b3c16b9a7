//! Audio backend using rodio.
//!
//! This module provides `RodioAudio`, which owns one looping output per
//! catalog track plus detached sinks for completion chimes. Outputs are
//! created once at startup and reused for the lifetime of the process.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use rodio::source::{SineWave, Source};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tracing::{debug, warn};

use super::chime;
use super::error::SoundError;
use super::source::resolve_source;
use super::{AudioTransport, ChimePlayer};
use crate::catalog::Catalog;
use crate::types::{clamp_volume, SoundKind, Track};

/// A track's output: its sink and whether the looped decoder is queued.
struct TrackOutput {
    sink: Sink,
    loaded: AtomicBool,
}

/// rodio-backed audio transport and chime player.
pub struct RodioAudio {
    /// The audio output stream (must be kept alive for playback).
    _stream: OutputStream,
    /// Handle to the output stream for creating sinks.
    stream_handle: OutputStreamHandle,
    sounds_dir: PathBuf,
    outputs: HashMap<String, TrackOutput>,
}

impl RodioAudio {
    /// Opens the default output device and creates one paused sink per track.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::DeviceNotAvailable` if no audio output device
    /// is available, or `SoundError::StreamError` if a sink cannot be created.
    pub fn new(catalog: &Catalog, sounds_dir: impl Into<PathBuf>) -> Result<Self, SoundError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SoundError::DeviceNotAvailable(e.to_string()))?;

        let mut outputs = HashMap::with_capacity(catalog.tracks().len());
        for track in catalog.tracks() {
            let sink =
                Sink::try_new(&stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))?;
            sink.pause();
            outputs.insert(
                track.id.clone(),
                TrackOutput {
                    sink,
                    loaded: AtomicBool::new(false),
                },
            );
        }

        debug!("Audio output stream initialized with {} track outputs", outputs.len());

        Ok(Self {
            _stream: stream,
            stream_handle,
            sounds_dir: sounds_dir.into(),
            outputs,
        })
    }

    /// Directory track locators are resolved against.
    pub fn sounds_dir(&self) -> &Path {
        &self.sounds_dir
    }

    fn output(&self, track_id: &str) -> Option<&TrackOutput> {
        let output = self.outputs.get(track_id);
        if output.is_none() {
            warn!("No audio output for track '{}'", track_id);
        }
        output
    }

    fn load(&self, track: &Track, output: &TrackOutput) -> Result<(), SoundError> {
        let path = resolve_source(&self.sounds_dir, &track.source)?;
        let file = File::open(&path)
            .map_err(|e| SoundError::FileNotFound(format!("{}: {}", path.display(), e)))?;
        let decoder = Decoder::new_looped(BufReader::new(file))
            .map_err(|e| SoundError::DecodeError(format!("{}: {}", path.display(), e)))?;

        output.sink.append(decoder);
        output.loaded.store(true, Ordering::Relaxed);
        debug!("Loaded looping source for '{}' from {:?}", track.id, path);
        Ok(())
    }
}

impl AudioTransport for RodioAudio {
    fn play(&self, track: &Track, volume: f32) -> Result<(), SoundError> {
        let output = self
            .output(&track.id)
            .ok_or_else(|| SoundError::UnknownTrack(track.id.clone()))?;

        output.sink.set_volume(clamp_volume(volume));
        if !output.loaded.load(Ordering::Relaxed) {
            self.load(track, output)?;
        }
        output.sink.play();
        Ok(())
    }

    fn pause(&self, track_id: &str) {
        if let Some(output) = self.output(track_id) {
            output.sink.pause();
        }
    }

    fn stop(&self, track_id: &str) {
        if let Some(output) = self.output(track_id) {
            // clear() drops the queued loop and leaves the sink paused
            output.sink.clear();
            output.loaded.store(false, Ordering::Relaxed);
        }
    }

    fn set_volume(&self, track_id: &str, volume: f32) {
        if let Some(output) = self.output(track_id) {
            output.sink.set_volume(clamp_volume(volume));
        }
    }

    fn stop_all(&self) {
        for output in self.outputs.values() {
            output.sink.clear();
            output.loaded.store(false, Ordering::Relaxed);
        }
        debug!("Stopped all track outputs");
    }
}

impl ChimePlayer for RodioAudio {
    fn play_chime(&self, kind: SoundKind) -> Result<(), SoundError> {
        let sink =
            Sink::try_new(&self.stream_handle).map_err(|e| SoundError::StreamError(e.to_string()))?;

        let mut tones = chime::tones(kind).iter();
        let Some(first) = tones.next() else {
            return Ok(());
        };

        let voice = |t: &chime::Tone| {
            SineWave::new(t.frequency)
                .take_duration(t.duration)
                .amplify(t.gain)
                .delay(t.start)
        };
        let mut mixed: Box<dyn Source<Item = f32> + Send> = Box::new(voice(first));
        for t in tones {
            mixed = Box::new(mixed.mix(voice(t)));
        }

        sink.append(mixed);
        sink.detach(); // Non-blocking: the chime continues after this returns

        debug!("Chime '{}' started (detached)", kind.as_str());
        Ok(())
    }
}

impl std::fmt::Debug for RodioAudio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioAudio")
            .field("sounds_dir", &self.sounds_dir)
            .field("outputs", &self.outputs.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    // Note: These tests need an audio device and return early without one
    // (e.g., CI containers).

    #[test]
    fn test_creates_one_output_per_track() {
        let catalog = catalog::builtin();
        let audio = match RodioAudio::new(&catalog, "/nonexistent") {
            Ok(a) => a,
            Err(_) => return,
        };
        assert_eq!(audio.outputs.len(), catalog.tracks().len());
    }

    #[test]
    fn test_play_missing_file_reports_error() {
        let catalog = catalog::builtin();
        let audio = match RodioAudio::new(&catalog, "/nonexistent") {
            Ok(a) => a,
            Err(_) => return,
        };

        let track = catalog.track("rain").unwrap();
        let result = audio.play(track, 0.5);
        assert!(matches!(result, Err(SoundError::FileNotFound(_))));
    }

    #[test]
    fn test_chimes_do_not_fail() {
        let catalog = catalog::builtin();
        let audio = match RodioAudio::new(&catalog, "/nonexistent") {
            Ok(a) => a,
            Err(_) => return,
        };
        assert!(audio.play_chime(SoundKind::Beep).is_ok());
        assert!(audio.play_chime(SoundKind::Bell).is_ok());
    }

    #[test]
    fn test_debug_impl() {
        let catalog = catalog::builtin();
        let audio = match RodioAudio::new(&catalog, "/nonexistent") {
            Ok(a) => a,
            Err(_) => return,
        };
        assert!(format!("{:?}", audio).contains("RodioAudio"));
    }
}
