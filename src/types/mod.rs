//! Core data types for ambience.
//!
//! This module defines the data structures used for:
//! - The static track and background catalog entries
//! - Playback state (single/mix mode, volumes, background)
//! - Timer state and the preferences that outlive a single timer
//! - Saved mixes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Volume applied to tracks when nothing else has been chosen.
pub const DEFAULT_MASTER_VOLUME: f32 = 0.5;

/// Clamps a volume into `[0.0, 1.0]`. NaN is treated as silence.
#[must_use]
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

// ============================================================================
// Category
// ============================================================================

/// Fixed set of catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Nature,
    Rain,
    Animals,
    Urban,
    Places,
    Transport,
    Things,
    Noise,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 8] = [
        Category::Nature,
        Category::Rain,
        Category::Animals,
        Category::Urban,
        Category::Places,
        Category::Transport,
        Category::Things,
        Category::Noise,
    ];

    /// Returns the string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Nature => "nature",
            Category::Rain => "rain",
            Category::Animals => "animals",
            Category::Urban => "urban",
            Category::Places => "places",
            Category::Transport => "transport",
            Category::Things => "things",
            Category::Noise => "noise",
        }
    }
}

// ============================================================================
// Track / BackgroundImage
// ============================================================================

/// An immutable catalog entry describing one looping ambient track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique, stable key
    pub id: String,
    /// Display name
    pub name: String,
    /// Catalog category
    pub category: Category,
    /// Renderer-side icon asset reference
    pub icon: String,
    /// Audio source locator
    pub source: String,
    /// Optional thumbnail image locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Optional background image locator shown while this track is current
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Track {
    /// Creates a track without thumbnail or background image.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        icon: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            icon: icon.into(),
            source: source.into(),
            thumbnail: None,
            background: None,
        }
    }

    /// Sets the background image locator.
    #[must_use]
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = Some(background.into());
        self
    }

    /// Sets the thumbnail locator.
    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

/// A selectable background image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub id: String,
    pub name: String,
    pub source: String,
}

impl BackgroundImage {
    pub fn new(id: impl Into<String>, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: source.into(),
        }
    }
}

// ============================================================================
// Playback
// ============================================================================

/// A track id paired with its runtime volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTrackRef {
    pub track_id: String,
    pub volume: f32,
}

impl ActiveTrackRef {
    /// Creates a reference, clamping the volume.
    pub fn new(track_id: impl Into<String>, volume: f32) -> Self {
        Self {
            track_id: track_id.into(),
            volume: clamp_volume(volume),
        }
    }
}

/// Playback mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// At most one active track
    #[default]
    Single,
    /// Several tracks with independent volumes
    Mix,
}

impl PlaybackMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackMode::Single => "single",
            PlaybackMode::Mix => "mix",
        }
    }
}

/// Background selection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BackgroundState {
    /// Id of the user-selected background image
    pub selected: String,
    /// Whether the current track's own image replaces the selection
    pub follow_current_track: bool,
    /// Locator of the image actually on display
    pub displayed: String,
}

/// Root playback state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub mode: PlaybackMode,
    pub is_playing: bool,
    /// Only meaningful in single mode
    pub current_track: Option<String>,
    /// Ordered, unique by track id
    pub active_tracks: Vec<ActiveTrackRef>,
    pub master_volume: f32,
    pub background: BackgroundState,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            mode: PlaybackMode::Single,
            is_playing: false,
            current_track: None,
            active_tracks: Vec::new(),
            master_volume: DEFAULT_MASTER_VOLUME,
            background: BackgroundState::default(),
        }
    }
}

impl PlaybackState {
    /// Returns true if the track is in the active set.
    pub fn is_active(&self, track_id: &str) -> bool {
        self.active_track(track_id).is_some()
    }

    /// Returns the active entry for a track.
    pub fn active_track(&self, track_id: &str) -> Option<&ActiveTrackRef> {
        self.active_tracks.iter().find(|t| t.track_id == track_id)
    }

    /// Returns the ids of the active tracks in order.
    pub fn active_ids(&self) -> Vec<String> {
        self.active_tracks.iter().map(|t| t.track_id.clone()).collect()
    }

    /// Checks the mode invariants.
    ///
    /// Single mode holds at most one active entry mirroring `current_track`;
    /// mix mode never has a current track.
    pub fn is_consistent(&self) -> bool {
        match self.mode {
            PlaybackMode::Single => match (&self.current_track, self.active_tracks.as_slice()) {
                (None, []) => true,
                (Some(current), [only]) => *current == only.track_id,
                _ => false,
            },
            PlaybackMode::Mix => self.current_track.is_none(),
        }
    }
}

// ============================================================================
// Timer
// ============================================================================

/// Timer phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    #[default]
    Focus,
    Break,
}

impl TimerPhase {
    /// Returns the string representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPhase::Focus => "focus",
            TimerPhase::Break => "break",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TimerPhase::Focus => "Focus",
            TimerPhase::Break => "Break",
        }
    }
}

/// Completion sound played when a phase ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    #[default]
    Beep,
    Bell,
}

impl SoundKind {
    /// Returns the string representation of the sound kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundKind::Beep => "beep",
            SoundKind::Bell => "bell",
        }
    }
}

fn default_play_sound() -> bool {
    true
}

/// Timer preferences, persisted independently of any timer run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerPreferences {
    /// Show whole minutes only
    #[serde(default)]
    pub hide_seconds: bool,
    /// Play a chime when a phase ends
    #[serde(default = "default_play_sound")]
    pub play_sound: bool,
    /// Which chime to play
    #[serde(default)]
    pub sound_kind: SoundKind,
    /// Resume playback when a timer starts
    #[serde(default)]
    pub auto_start: bool,
    /// Send a system notification when a phase ends
    #[serde(default)]
    pub show_notifications: bool,
}

impl Default for TimerPreferences {
    fn default() -> Self {
        Self {
            hide_seconds: false,
            play_sound: default_play_sound(),
            sound_kind: SoundKind::default(),
            auto_start: false,
            show_notifications: false,
        }
    }
}

/// State of the single focus/break timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_active: bool,
    pub is_paused: bool,
    pub phase: TimerPhase,
    /// Seconds
    pub focus_duration: u32,
    /// Seconds; zero means a simple timer without breaks
    pub break_duration: u32,
    /// Seconds left in the current phase
    pub remaining: u32,
    pub total_rounds: u32,
    /// 0-based
    pub current_round: u32,
    pub completed_rounds: u32,
    pub task: String,
    pub preferences: TimerPreferences,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(TimerPreferences::default())
    }
}

impl TimerState {
    /// Largest number of rounds a timer may run.
    pub const MAX_ROUNDS: u32 = 10;

    /// Creates an inactive timer carrying the given preferences.
    pub fn new(preferences: TimerPreferences) -> Self {
        Self {
            is_active: false,
            is_paused: false,
            phase: TimerPhase::Focus,
            focus_duration: 0,
            break_duration: 0,
            remaining: 0,
            total_rounds: 1,
            current_round: 0,
            completed_rounds: 0,
            task: String::new(),
            preferences,
        }
    }

    /// Initializes a fresh run in the focus phase.
    pub fn begin(&mut self, focus: u32, task: String, break_duration: u32, rounds: u32) {
        self.focus_duration = focus;
        self.break_duration = break_duration;
        self.total_rounds = rounds;
        self.task = task;
        self.restart();
    }

    /// Restarts the configured run from round 0.
    pub fn restart(&mut self) {
        self.current_round = 0;
        self.completed_rounds = 0;
        self.enter_phase(TimerPhase::Focus);
    }

    /// Jumps to a phase with its full duration and unpauses.
    pub fn enter_phase(&mut self, phase: TimerPhase) {
        self.phase = phase;
        self.remaining = self.duration_of(phase);
        self.is_active = true;
        self.is_paused = false;
    }

    /// Resets to inactive, zeroed values while keeping the preferences.
    pub fn clear(&mut self) {
        *self = Self::new(self.preferences.clone());
    }

    /// Stops the run in place, keeping the round counters for display.
    pub fn finish(&mut self) {
        self.is_active = false;
        self.is_paused = false;
        self.remaining = 0;
    }

    /// Decrements the timer by one second.
    ///
    /// Returns true if the phase has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    /// Full duration of a phase in seconds.
    pub fn duration_of(&self, phase: TimerPhase) -> u32 {
        match phase {
            TimerPhase::Focus => self.focus_duration,
            TimerPhase::Break => self.break_duration,
        }
    }

    /// Returns true for a timer without breaks.
    pub fn is_simple(&self) -> bool {
        self.break_duration == 0
    }

    /// Returns true if the timer is counting down.
    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_paused
    }

    /// Formats the remaining time for display.
    ///
    /// With `hide_seconds` the value is rounded up to whole minutes.
    pub fn format_remaining(&self) -> String {
        if self.preferences.hide_seconds {
            let minutes = self.remaining.div_ceil(60);
            format!("{} min", minutes)
        } else {
            format!("{:02}:{:02}", self.remaining / 60, self.remaining % 60)
        }
    }
}

// ============================================================================
// Saved mixes
// ============================================================================

/// One track of a saved mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixEntry {
    pub track_id: String,
    pub volume: f32,
}

impl MixEntry {
    pub fn new(track_id: impl Into<String>, volume: f32) -> Self {
        Self {
            track_id: track_id.into(),
            volume: clamp_volume(volume),
        }
    }
}

impl From<&ActiveTrackRef> for MixEntry {
    fn from(active: &ActiveTrackRef) -> Self {
        Self::new(active.track_id.clone(), active.volume)
    }
}

/// A durably stored, named snapshot of a mix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedMix {
    pub id: String,
    pub name: String,
    pub tracks: Vec<MixEntry>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl SavedMix {
    /// Creates a mix with a fresh time-ordered id.
    pub fn new(name: impl Into<String>, tracks: Vec<MixEntry>, background: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            name: name.into(),
            tracks,
            created_at: Utc::now(),
            background,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod volume_tests {
        use super::*;

        #[test]
        fn test_clamp_volume() {
            assert_eq!(clamp_volume(0.3), 0.3);
            assert_eq!(clamp_volume(-1.0), 0.0);
            assert_eq!(clamp_volume(1.7), 1.0);
            assert_eq!(clamp_volume(f32::NAN), 0.0);
        }

        #[test]
        fn test_active_track_ref_clamps() {
            let active = ActiveTrackRef::new("rain", 3.0);
            assert_eq!(active.volume, 1.0);
        }
    }

    mod playback_state_tests {
        use super::*;

        #[test]
        fn test_default_state() {
            let state = PlaybackState::default();
            assert_eq!(state.mode, PlaybackMode::Single);
            assert!(!state.is_playing);
            assert_eq!(state.master_volume, DEFAULT_MASTER_VOLUME);
            assert!(state.is_consistent());
        }

        #[test]
        fn test_single_mode_consistency() {
            let mut state = PlaybackState {
                current_track: Some("rain".to_string()),
                active_tracks: vec![ActiveTrackRef::new("rain", 0.5)],
                ..PlaybackState::default()
            };
            assert!(state.is_consistent());

            state.active_tracks.push(ActiveTrackRef::new("fire", 0.5));
            assert!(!state.is_consistent());

            state.active_tracks = vec![ActiveTrackRef::new("fire", 0.5)];
            assert!(!state.is_consistent());
        }

        #[test]
        fn test_mix_mode_consistency() {
            let mut state = PlaybackState {
                mode: PlaybackMode::Mix,
                active_tracks: vec![
                    ActiveTrackRef::new("rain", 0.2),
                    ActiveTrackRef::new("fire", 0.8),
                ],
                ..PlaybackState::default()
            };
            assert!(state.is_consistent());
            assert_eq!(state.active_ids(), vec!["rain", "fire"]);
            assert_eq!(state.active_track("fire").map(|t| t.volume), Some(0.8));

            state.current_track = Some("rain".to_string());
            assert!(!state.is_consistent());
        }

        #[test]
        fn test_mode_serialize() {
            let json = serde_json::to_string(&PlaybackMode::Mix).unwrap();
            assert_eq!(json, "\"mix\"");
        }
    }

    mod timer_state_tests {
        use super::*;

        #[test]
        fn test_new_state_is_inactive() {
            let state = TimerState::default();
            assert!(!state.is_active);
            assert!(!state.is_paused);
            assert_eq!(state.phase, TimerPhase::Focus);
            assert_eq!(state.remaining, 0);
            assert_eq!(state.total_rounds, 1);
        }

        #[test]
        fn test_begin() {
            let mut state = TimerState::default();
            state.begin(1500, "Write".to_string(), 300, 4);

            assert!(state.is_running());
            assert_eq!(state.phase, TimerPhase::Focus);
            assert_eq!(state.remaining, 1500);
            assert_eq!(state.total_rounds, 4);
            assert_eq!(state.task, "Write");
            assert!(!state.is_simple());
        }

        #[test]
        fn test_tick_saturates() {
            let mut state = TimerState::default();
            state.begin(2, String::new(), 0, 1);

            assert!(!state.tick());
            assert!(state.tick());
            assert!(state.tick());
            assert_eq!(state.remaining, 0);
        }

        #[test]
        fn test_clear_keeps_preferences() {
            let prefs = TimerPreferences {
                hide_seconds: true,
                sound_kind: SoundKind::Bell,
                ..TimerPreferences::default()
            };
            let mut state = TimerState::new(prefs.clone());
            state.begin(60, "x".to_string(), 30, 2);

            state.clear();

            assert!(!state.is_active);
            assert_eq!(state.focus_duration, 0);
            assert_eq!(state.task, "");
            assert_eq!(state.preferences, prefs);
        }

        #[test]
        fn test_format_remaining() {
            let mut state = TimerState::default();
            state.remaining = 1499;
            assert_eq!(state.format_remaining(), "24:59");

            state.preferences.hide_seconds = true;
            assert_eq!(state.format_remaining(), "25 min");

            state.remaining = 0;
            assert_eq!(state.format_remaining(), "0 min");
        }

        #[test]
        fn test_preferences_defaults_from_partial_json() {
            let prefs: TimerPreferences = serde_json::from_str(r#"{"hide_seconds":true}"#).unwrap();
            assert!(prefs.hide_seconds);
            assert!(prefs.play_sound);
            assert_eq!(prefs.sound_kind, SoundKind::Beep);
        }
    }

    mod saved_mix_tests {
        use super::*;

        #[test]
        fn test_new_mix_ids_differ() {
            let a = SavedMix::new("A", vec![MixEntry::new("rain", 0.5)], None);
            let b = SavedMix::new("A", vec![MixEntry::new("rain", 0.5)], None);
            assert_ne!(a.id, b.id);
        }

        #[test]
        fn test_serialize_deserialize() {
            let mix = SavedMix::new(
                "Evening",
                vec![MixEntry::new("rain", 0.2), MixEntry::new("fire", 0.55)],
                Some("forest".to_string()),
            );
            let json = serde_json::to_string(&mix).unwrap();
            let back: SavedMix = serde_json::from_str(&json).unwrap();
            assert_eq!(back, mix);
        }
    }
}
