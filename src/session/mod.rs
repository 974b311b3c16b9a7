//! The player/timer state model.
//!
//! `Session` is the single owner of all mutable state: the player, the
//! timer engine, the saved-mix library and the handle of the tick loop.
//! Every user command goes through one of its methods, which applies the
//! change, performs side effects, persists a snapshot and reports anything
//! the user should see as a [`Notice`].
//!
//! # Architecture
//!
//! ```text
//!                    ┌──────────────────────────────────────────┐
//!  commands ───────▶ │                 Session                  │ ──▶ notices
//!                    │  ┌────────┐  ┌─────────────┐  ┌───────┐  │ ──▶ timer events
//!  ticks ──────────▶ │  │ Player │  │ TimerEngine │  │ Mixes │  │
//!   (TickLoop)       │  └───┬────┘  └──────┬──────┘  └───┬───┘  │
//!                    └──────┼──────────────┼─────────────┼──────┘
//!                           ▼              ▼             ▼
//!                    AudioTransport  Chime/Notifier  PreferenceStore/MixStore
//! ```
//!
//! The tick loop only sends its generation number. The owner receives it
//! from [`SessionChannels::ticks`] and calls [`Session::handle_tick`], so
//! state is never touched from another task. Ticks still queued from a
//! replaced or stopped loop carry an old generation and are dropped.

mod notice;
mod persist;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

pub use notice::{Notice, NoticeLevel};

use crate::catalog::Catalog;
use crate::config::AppConfig;
use crate::mixes::{MixError, MixLibrary};
use crate::notification::{phase_complete_content, NotificationError, Notifier, Permission};
use crate::player::{Player, PlayerResult};
use crate::share;
use crate::sound::{AudioTransport, ChimePlayer};
use crate::storage::{MixStore, PreferenceStore};
use crate::timer::{PhaseCompletion, TickLoop, TimerEngine, TimerError, TimerEvent};
use crate::types::{
    PlaybackMode, PlaybackState, SavedMix, SoundKind, TimerPhase, TimerPreferences, TimerState,
};

// ============================================================================
// Setup
// ============================================================================

/// Collaborators a session is built from.
pub struct Services {
    pub catalog: Arc<Catalog>,
    pub transport: Arc<dyn AudioTransport>,
    pub chime: Arc<dyn ChimePlayer>,
    pub notifier: Arc<dyn Notifier>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub mixes: Arc<dyn MixStore>,
}

/// Tunables taken from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub preference_ttl_days: u32,
    pub default_volume: f32,
    pub share_base_url: String,
    pub autoplay_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            preference_ttl_days: config.preference_ttl_days,
            default_volume: config.initial_volume(),
            share_base_url: config.share_base_url.clone(),
            autoplay_delay: config.autoplay_delay(),
        }
    }
}

/// Receiving ends of the session's outgoing channels.
#[derive(Debug)]
pub struct SessionChannels {
    /// Generation of the sending loop, once per second while a timer runs
    pub ticks: mpsc::UnboundedReceiver<u64>,
    pub timer_events: mpsc::UnboundedReceiver<TimerEvent>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

/// Outcome of [`Session::bootstrap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    /// True if a shared mix replaced the playback
    pub loaded: bool,
    /// Delay after which the owner should call [`Session::autoplay`]
    pub autoplay_after: Option<Duration>,
    /// The URL without the share parameter
    pub cleaned_url: String,
}

// ============================================================================
// Session
// ============================================================================

/// Owner of the playback, timer and saved-mix state.
pub struct Session {
    player: Player,
    timer: TimerEngine,
    library: MixLibrary,
    preferences: Arc<dyn PreferenceStore>,
    chime: Arc<dyn ChimePlayer>,
    notifier: Arc<dyn Notifier>,
    options: SessionOptions,
    tick_tx: mpsc::UnboundedSender<u64>,
    tick_loop: Option<TickLoop>,
    tick_generation: u64,
    notice_tx: mpsc::UnboundedSender<Notice>,
}

impl Session {
    /// Creates a session with default playback state.
    ///
    /// Call [`restore`](Self::restore) to pick up the stored preferences.
    pub fn new(services: Services, options: SessionOptions) -> (Self, SessionChannels) {
        let (tick_tx, ticks) = mpsc::unbounded_channel();
        let (event_tx, timer_events) = mpsc::unbounded_channel();
        let (notice_tx, notices) = mpsc::unbounded_channel();

        let mut player = Player::new(services.catalog, services.transport);
        player.set_master_volume(options.default_volume);

        let session = Self {
            player,
            timer: TimerEngine::new(TimerPreferences::default(), event_tx),
            library: MixLibrary::load(services.mixes),
            preferences: services.preferences,
            chime: services.chime,
            notifier: services.notifier,
            options,
            tick_tx,
            tick_loop: None,
            tick_generation: 0,
            notice_tx,
        };

        let channels = SessionChannels {
            ticks,
            timer_events,
            notices,
        };
        (session, channels)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn playback(&self) -> &PlaybackState {
        self.player.state()
    }

    pub fn timer(&self) -> &TimerState {
        self.timer.state()
    }

    pub fn catalog(&self) -> &Catalog {
        self.player.catalog()
    }

    pub fn mixes(&self) -> &[SavedMix] {
        self.library.list()
    }

    pub fn library(&self) -> &MixLibrary {
        &self.library
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Returns true while a tick loop is attached.
    pub fn has_tick_loop(&self) -> bool {
        self.tick_loop.is_some()
    }

    /// Remaining timer time formatted for display.
    pub fn format_remaining(&self) -> String {
        self.timer.state().format_remaining()
    }

    fn notice(&self, notice: Notice) {
        if notice.is_error() {
            warn!("{}", notice.message);
        } else {
            debug!("{}", notice.message);
        }
        if self.notice_tx.send(notice).is_err() {
            trace!("No notice receiver");
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Loads the stored playback state and timer preferences.
    ///
    /// No audio starts; a session that was playing comes back paused.
    pub fn restore(&mut self) {
        let store = self.preferences.as_ref();
        let saved = persist::load_playback(store, self.options.default_volume);
        self.player.restore(saved);
        self.timer
            .set_preferences(persist::load_timer_preferences(store));

        // Permission is not remembered between runs
        if self.timer.preferences().show_notifications {
            let permission = match self.notifier.permission() {
                Permission::Default => self.notifier.request_permission(),
                known => known,
            };
            debug!("Notification permission on restore: {:?}", permission);
            if !permission.is_granted() {
                self.disable_blocked_notifications();
            }
        }
        info!(
            "Session restored: {} mode, {} tracks",
            self.playback().mode.as_str(),
            self.playback().active_tracks.len()
        );
    }

    /// Applies the share token carried by `url`, if any.
    ///
    /// A decodable token replaces the playback with the shared mix. An
    /// undecodable one leaves the state alone and reports an error notice.
    pub fn bootstrap(&mut self, url: &str) -> Bootstrap {
        let cleaned_url = share::strip_token(url);
        let mut outcome = Bootstrap {
            loaded: false,
            autoplay_after: None,
            cleaned_url,
        };

        let Some(token) = share::token_from_url(url) else {
            return outcome;
        };
        let Some(shared) = share::decode(&token) else {
            self.notice(Notice::error("This share link is invalid or damaged"));
            return outcome;
        };

        let catalog = self.player.catalog();
        if !shared.tracks.iter().any(|t| catalog.contains(&t.track_id)) {
            self.notice(Notice::error(format!(
                "None of the tracks in '{}' are available",
                shared.name
            )));
            return outcome;
        }

        self.player
            .load_mix(&shared.tracks, shared.background.as_deref());
        self.persist_playback();
        self.notice(Notice::info(format!("Loaded shared mix '{}'", shared.name)));

        outcome.loaded = true;
        outcome.autoplay_after = shared.autoplay.then_some(self.options.autoplay_delay);
        outcome
    }

    /// Starts playback if it is not already running.
    pub fn autoplay(&mut self) {
        if !self.playback().is_playing {
            let result = self.player.toggle_play_pause();
            self.after_playback(result);
        }
    }

    /// Stops all audio and the tick loop.
    pub fn shutdown(&mut self) {
        self.stop_tick_loop();
        self.player.stop_all();
        info!("Session shut down");
    }

    // ========================================================================
    // Playback commands
    // ========================================================================

    fn after_playback(&mut self, result: PlayerResult) {
        if let Err(e) = result {
            self.notice(Notice::error(e.to_string()).with_hint(e.suggestion()));
        }
        self.persist_playback();
    }

    fn persist_playback(&self) {
        if let Err(e) = persist::save_playback(
            self.preferences.as_ref(),
            self.player.state(),
            self.options.preference_ttl_days,
        ) {
            warn!("Failed to persist playback state: {} ({})", e, e.suggestion());
        }
    }

    pub fn activate_track(&mut self, track_id: &str) {
        let result = self.player.activate_track(track_id);
        self.after_playback(result);
    }

    pub fn toggle_play_pause(&mut self) {
        let result = self.player.toggle_play_pause();
        self.after_playback(result);
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.player.set_mode(mode);
        self.persist_playback();
    }

    pub fn set_track_volume(&mut self, track_id: &str, volume: f32) {
        self.player.set_track_volume(track_id, volume);
        self.persist_playback();
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.player.set_master_volume(volume);
        self.persist_playback();
    }

    pub fn set_background(&mut self, background_id: &str) {
        self.player.set_background(background_id);
        self.persist_playback();
    }

    pub fn toggle_follow_current_track(&mut self) {
        self.player.toggle_follow_current_track();
        self.persist_playback();
    }

    // ========================================================================
    // Timer commands
    // ========================================================================

    /// Aborts the tick loop and invalidates any tick it already queued.
    fn stop_tick_loop(&mut self) {
        self.tick_loop = None;
        self.tick_generation += 1;
    }

    fn restart_tick_loop(&mut self) {
        // Drop the old loop first so at most one ever runs
        self.stop_tick_loop();
        self.tick_loop = TickLoop::spawn(self.tick_tx.clone(), self.tick_generation);
    }

    /// Starts a timer, replacing any running one.
    ///
    /// With `auto_start` set, playback resumes if nothing is playing.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero focus duration or a round count outside
    /// 1..=10; an error notice is sent as well.
    pub fn start_timer(
        &mut self,
        focus_seconds: u32,
        task: &str,
        break_seconds: u32,
        rounds: u32,
    ) -> Result<(), TimerError> {
        if let Err(e) = self.timer.start(focus_seconds, task, break_seconds, rounds) {
            self.notice(Notice::error(e.to_string()).with_hint(e.suggestion()));
            return Err(e);
        }
        self.restart_tick_loop();

        if self.timer.preferences().auto_start && !self.playback().is_playing {
            debug!("Auto-starting playback with the timer");
            let result = self.player.toggle_play_pause();
            self.after_playback(result);
        }
        Ok(())
    }

    /// Handles a message from [`SessionChannels::ticks`].
    ///
    /// Ticks sent by a loop that has since been replaced or stopped are
    /// ignored, so they never count against the current run.
    pub fn handle_tick(&mut self, generation: u64) -> Option<PhaseCompletion> {
        if generation != self.tick_generation {
            trace!(
                "Ignoring tick from loop {} (current {})",
                generation,
                self.tick_generation
            );
            return None;
        }
        self.tick()
    }

    /// Advances the timer by one second.
    ///
    /// When a phase ends this plays the chime and sends the notification
    /// as the preferences ask, and drops the tick loop once the run is over.
    pub fn tick(&mut self) -> Option<PhaseCompletion> {
        let completion = self.timer.tick()?;
        let preferences = self.timer.preferences().clone();

        if preferences.play_sound {
            if let Err(e) = self.chime.play_chime(preferences.sound_kind) {
                warn!("Failed to play chime: {} ({})", e, e.suggestion());
            }
        }

        if preferences.show_notifications && self.notifier.permission().is_granted() {
            let content =
                phase_complete_content(completion.ended, completion.next, &completion.task);
            match self.notifier.notify(&content) {
                Ok(()) => {}
                Err(e) if e.is_permission_error() => self.disable_blocked_notifications(),
                Err(e) => warn!("Failed to show notification: {} ({})", e, e.suggestion()),
            }
        }

        if completion.is_finished() {
            self.stop_tick_loop();
            self.notice(Notice::info("Timer finished"));
        }
        Some(completion)
    }

    /// Stops and zeroes the timer, keeping the preferences.
    pub fn cancel_timer(&mut self) {
        self.stop_tick_loop();
        self.timer.cancel();
    }

    /// Jumps to `phase`, or restarts the run when no phase is given.
    pub fn reset_timer(&mut self, phase: Option<TimerPhase>) {
        if self.timer.reset(phase) {
            self.restart_tick_loop();
        }
    }

    pub fn pause_resume_timer(&mut self) {
        self.timer.toggle_pause();
    }

    /// Adds minutes to the current phase. Ignored without an active timer.
    pub fn add_minutes_to_timer(&mut self, minutes: u32) {
        if let Err(e) = self.timer.add_minutes(minutes) {
            debug!("Ignoring add of {} minutes: {}", minutes, e);
        }
    }

    // ========================================================================
    // Timer preferences
    // ========================================================================

    fn update_preferences(&mut self, update: impl FnOnce(&mut TimerPreferences)) {
        let mut preferences = self.timer.preferences().clone();
        update(&mut preferences);
        if let Err(e) = persist::save_timer_preferences(self.preferences.as_ref(), &preferences) {
            warn!("Failed to persist timer preferences: {} ({})", e, e.suggestion());
        }
        self.timer.set_preferences(preferences);
    }

    pub fn set_hide_seconds(&mut self, hide_seconds: bool) {
        self.update_preferences(|p| p.hide_seconds = hide_seconds);
    }

    pub fn set_play_sound(&mut self, play_sound: bool) {
        self.update_preferences(|p| p.play_sound = play_sound);
    }

    pub fn set_sound_kind(&mut self, sound_kind: SoundKind) {
        self.update_preferences(|p| p.sound_kind = sound_kind);
    }

    pub fn set_auto_start(&mut self, auto_start: bool) {
        self.update_preferences(|p| p.auto_start = auto_start);
    }

    /// Turns phase notifications on or off.
    ///
    /// Turning them on asks for permission the first time. If permission
    /// is refused the preference stays off and an error notice is sent.
    pub fn set_show_notifications(&mut self, show: bool) {
        if show && !self.notifier.request_permission().is_granted() {
            self.disable_blocked_notifications();
            return;
        }
        self.update_preferences(|p| p.show_notifications = show);
    }

    fn disable_blocked_notifications(&mut self) {
        let e = NotificationError::PermissionDenied;
        self.notice(
            Notice::error("Notifications are blocked, turning them off").with_hint(e.suggestion()),
        );
        self.update_preferences(|p| p.show_notifications = false);
    }

    // ========================================================================
    // Saved mixes
    // ========================================================================

    /// Saves the active tracks as a mix.
    ///
    /// Sends an error notice and returns `None` when nothing is active.
    pub fn save_mix(&mut self, name: Option<&str>) -> Option<SavedMix> {
        let state = self.player.state();
        let background = Some(state.background.selected.clone()).filter(|b| !b.is_empty());

        match self.library.save(name, &state.active_tracks, background) {
            Ok(mix) => {
                self.notice(Notice::info(format!("Saved mix '{}'", mix.name)));
                Some(mix)
            }
            Err(e) => {
                self.notice(Notice::error(e.to_string()).with_hint(e.suggestion()));
                None
            }
        }
    }

    /// Loads a saved mix, paused.
    ///
    /// # Errors
    ///
    /// Returns `MixError::UnknownMix` if no mix has this id.
    pub fn load_mix(&mut self, id: &str) -> Result<(), MixError> {
        let Some(mix) = self.library.get(id).cloned() else {
            let e = MixError::UnknownMix(id.to_string());
            self.notice(Notice::error(e.to_string()).with_hint(e.suggestion()));
            return Err(e);
        };

        self.player.load_mix(&mix.tracks, mix.background.as_deref());
        self.persist_playback();
        self.notice(Notice::info(format!("Loaded mix '{}'", mix.name)));
        Ok(())
    }

    /// Deletes a saved mix. Unknown ids are ignored.
    pub fn delete_mix(&mut self, id: &str) {
        if let Err(e) = self.library.delete(id) {
            self.notice(Notice::error(e.to_string()).with_hint(e.suggestion()));
        }
    }

    /// Share link of a saved mix, or `None` with an error notice if the id
    /// is unknown.
    pub fn share_mix(&self, id: &str) -> Option<String> {
        match self.library.share_url(id, &self.options.share_base_url) {
            Ok(url) => Some(url),
            Err(e) => {
                self.notice(Notice::error(e.to_string()).with_hint(e.suggestion()));
                None
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("player", &self.player)
            .field("timer", &self.timer)
            .field("library", &self.library)
            .field("tick_loop", &self.tick_loop.is_some())
            .finish_non_exhaustive()
    }
}
