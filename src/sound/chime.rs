//! Timer completion chimes.
//!
//! Chimes are synthesized from short sine tones rather than shipped as
//! files, so a phase end is always audible even without a sounds directory.

use std::time::Duration;

use crate::types::SoundKind;

/// One sine tone of a chime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Frequency in Hz
    pub frequency: f32,
    /// Offset from the start of the chime
    pub start: Duration,
    pub duration: Duration,
    /// Linear gain, 0.0..=1.0
    pub gain: f32,
}

const fn tone(frequency: f32, start_ms: u64, duration_ms: u64, gain: f32) -> Tone {
    Tone {
        frequency,
        start: Duration::from_millis(start_ms),
        duration: Duration::from_millis(duration_ms),
        gain,
    }
}

/// Two short high blips.
const BEEP: &[Tone] = &[tone(880.0, 0, 120, 0.25), tone(880.0, 240, 120, 0.25)];

/// A struck bell: fundamental plus overtones, stepping down in loudness.
const BELL: &[Tone] = &[
    tone(660.0, 0, 250, 0.30),
    tone(1320.0, 0, 250, 0.10),
    tone(1980.0, 0, 150, 0.05),
    tone(660.0, 250, 300, 0.18),
    tone(1320.0, 250, 200, 0.05),
    tone(660.0, 550, 450, 0.08),
];

/// Returns the tones making up a chime.
#[must_use]
pub fn tones(kind: SoundKind) -> &'static [Tone] {
    match kind {
        SoundKind::Beep => BEEP,
        SoundKind::Bell => BELL,
    }
}

/// Total length of a chime.
#[must_use]
pub fn length(kind: SoundKind) -> Duration {
    tones(kind)
        .iter()
        .map(|t| t.start + t.duration)
        .max()
        .unwrap_or_default()
}
