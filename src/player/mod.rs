//! Playback half of the state model.
//!
//! `Player` owns the `PlaybackState` and is the only thing that commands
//! the audio transport. Every command updates the state first and then
//! performs its audio side effects; a failed side effect is returned as an
//! error but never rolled back.

mod error;

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

pub use error::PlayerError;

use crate::catalog::Catalog;
use crate::sound::AudioTransport;
use crate::types::{
    clamp_volume, ActiveTrackRef, BackgroundState, MixEntry, PlaybackMode, PlaybackState, Track,
};

/// Result of a player command.
pub type PlayerResult = Result<(), PlayerError>;

/// Playback controller over the catalog and an audio transport.
pub struct Player {
    catalog: Arc<Catalog>,
    transport: Arc<dyn AudioTransport>,
    state: PlaybackState,
}

impl Player {
    /// Creates a stopped player showing the catalog's default background.
    pub fn new(catalog: Arc<Catalog>, transport: Arc<dyn AudioTransport>) -> Self {
        let mut state = PlaybackState::default();
        if let Some(background) = catalog.default_background() {
            state.background.selected = background.id.clone();
            state.background.displayed = background.source.clone();
        }

        Self {
            catalog,
            transport,
            state,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ========================================================================
    // Track activation
    // ========================================================================

    /// Activates or deactivates a track according to the playback mode.
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the track's audio fails to start.
    pub fn activate_track(&mut self, track_id: &str) -> PlayerResult {
        let Some(track) = self.catalog.track(track_id).cloned() else {
            warn!("Ignoring unknown track '{}'", track_id);
            return Ok(());
        };

        match self.state.mode {
            PlaybackMode::Single => self.activate_single(&track),
            PlaybackMode::Mix => self.activate_mix(&track),
        }
    }

    fn activate_single(&mut self, track: &Track) -> PlayerResult {
        let is_current = self.state.current_track.as_deref() == Some(track.id.as_str());

        if is_current && self.state.is_playing {
            self.stop_active();
            self.state.current_track = None;
            self.state.is_playing = false;
            self.refresh_background();
            debug!("Stopped '{}'", track.id);
            return Ok(());
        }

        self.stop_active();
        let volume = self.state.master_volume;
        self.state.current_track = Some(track.id.clone());
        self.state.active_tracks = vec![ActiveTrackRef::new(&track.id, volume)];
        self.state.is_playing = true;
        self.refresh_background();
        debug!("Playing '{}' (single)", track.id);

        self.transport
            .play(track, volume)
            .map_err(|e| PlayerError::playback(&track.id, e))
    }

    fn activate_mix(&mut self, track: &Track) -> PlayerResult {
        if let Some(index) = self
            .state
            .active_tracks
            .iter()
            .position(|t| t.track_id == track.id)
        {
            self.state.active_tracks.remove(index);
            self.transport.stop(&track.id);
            if self.state.active_tracks.is_empty() {
                self.state.is_playing = false;
            }
            debug!("Removed '{}' from mix", track.id);
            return Ok(());
        }

        let volume = self.state.master_volume;
        self.state.active_tracks.push(ActiveTrackRef::new(&track.id, volume));
        debug!("Added '{}' to mix", track.id);

        if self.state.is_playing {
            self.transport
                .play(track, volume)
                .map_err(|e| PlayerError::playback(&track.id, e))
        } else {
            // Adding to a paused mix starts the whole mix
            self.state.is_playing = true;
            self.play_active()
        }
    }

    /// Pauses when playing; otherwise resumes the active tracks, or starts
    /// the first catalog track when nothing is active.
    ///
    /// # Errors
    ///
    /// Returns the first failure when resuming tracks.
    pub fn toggle_play_pause(&mut self) -> PlayerResult {
        if self.state.is_playing {
            for track in &self.state.active_tracks {
                self.transport.pause(&track.track_id);
            }
            self.state.is_playing = false;
            debug!("Playback paused");
            return Ok(());
        }

        if self.state.active_tracks.is_empty() {
            let Some(first) = self.catalog.first().map(|t| t.id.clone()) else {
                return Ok(());
            };
            return self.activate_track(&first);
        }

        self.state.is_playing = true;
        debug!("Playback resumed");
        self.play_active()
    }

    // ========================================================================
    // Mode and volume
    // ========================================================================

    /// Switches between single and mix mode.
    ///
    /// Leaving mix mode keeps only the first active track, at the master
    /// volume.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        if self.state.mode == mode {
            return;
        }

        match mode {
            PlaybackMode::Single => {
                let mut tracks = std::mem::take(&mut self.state.active_tracks).into_iter();
                let kept = tracks.next();
                for dropped in tracks {
                    self.transport.stop(&dropped.track_id);
                }

                self.state.mode = PlaybackMode::Single;
                match kept {
                    Some(kept) => {
                        let volume = self.state.master_volume;
                        self.transport.set_volume(&kept.track_id, volume);
                        self.state.current_track = Some(kept.track_id.clone());
                        self.state.active_tracks = vec![ActiveTrackRef::new(kept.track_id, volume)];
                    }
                    None => {
                        self.state.current_track = None;
                        self.state.is_playing = false;
                    }
                }
            }
            PlaybackMode::Mix => {
                self.state.mode = PlaybackMode::Mix;
                self.state.current_track = None;
                self.state.background.follow_current_track = false;
            }
        }

        self.refresh_background();
        debug!("Playback mode set to {}", mode.as_str());
    }

    /// Sets the volume of an active track. Inactive tracks are ignored.
    pub fn set_track_volume(&mut self, track_id: &str, volume: f32) {
        let volume = clamp_volume(volume);
        let Some(entry) = self
            .state
            .active_tracks
            .iter_mut()
            .find(|t| t.track_id == track_id)
        else {
            debug!("Volume change for inactive track '{}' ignored", track_id);
            return;
        };

        entry.volume = volume;
        self.transport.set_volume(track_id, volume);
    }

    /// Sets the master volume. In single mode it applies to the playing
    /// track at once; mix volumes are left alone.
    pub fn set_master_volume(&mut self, volume: f32) {
        let volume = clamp_volume(volume);
        self.state.master_volume = volume;

        if self.state.mode == PlaybackMode::Single {
            for entry in &mut self.state.active_tracks {
                entry.volume = volume;
                self.transport.set_volume(&entry.track_id, volume);
            }
        }
    }

    // ========================================================================
    // Background
    // ========================================================================

    /// Selects a background image and stops following the current track.
    /// Unknown ids are ignored.
    pub fn set_background(&mut self, background_id: &str) {
        if self.catalog.background(background_id).is_none() {
            warn!("Ignoring unknown background '{}'", background_id);
            return;
        }

        self.state.background.selected = background_id.to_string();
        self.state.background.follow_current_track = false;
        self.refresh_background();
    }

    /// Flips whether the current track's own image replaces the selection.
    pub fn toggle_follow_current_track(&mut self) {
        let background = &mut self.state.background;
        background.follow_current_track = !background.follow_current_track;
        self.refresh_background();
    }

    /// Recomputes the displayed image from the selection and follow flag.
    fn refresh_background(&mut self) {
        let following = self.state.background.follow_current_track
            && self.state.mode == PlaybackMode::Single;
        let track_image = self
            .state
            .current_track
            .as_deref()
            .and_then(|id| self.catalog.track(id))
            .and_then(|t| t.background.clone());

        let displayed = match track_image {
            Some(image) if following => image,
            _ => self
                .catalog
                .background(&self.state.background.selected)
                .map(|b| b.source.clone())
                .unwrap_or_default(),
        };
        self.state.background.displayed = displayed;
    }

    // ========================================================================
    // Bulk state changes
    // ========================================================================

    /// Replaces the playback with a stopped mix.
    ///
    /// Entries for tracks missing from the catalog are dropped, as is a
    /// background that no longer exists. Returns the number of dropped
    /// entries.
    pub fn load_mix(&mut self, entries: &[MixEntry], background: Option<&str>) -> usize {
        self.transport.stop_all();

        let mut seen = HashSet::new();
        let active: Vec<ActiveTrackRef> = entries
            .iter()
            .filter(|e| self.catalog.contains(&e.track_id) && seen.insert(e.track_id.as_str()))
            .map(|e| ActiveTrackRef::new(&e.track_id, e.volume))
            .collect();
        let dropped = entries.len() - active.len();
        if dropped > 0 {
            warn!("Dropped {} mix entries not in the catalog", dropped);
        }

        self.state.mode = PlaybackMode::Mix;
        self.state.current_track = None;
        self.state.active_tracks = active;
        self.state.is_playing = false;
        self.state.background.follow_current_track = false;
        match background {
            Some(id) if self.catalog.background(id).is_some() => {
                self.state.background.selected = id.to_string();
            }
            Some(id) => warn!("Mix background '{}' no longer exists", id),
            None => {}
        }
        self.refresh_background();

        debug!("Loaded mix with {} tracks", self.state.active_tracks.len());
        dropped
    }

    /// Replaces the state with a persisted one, without starting audio.
    ///
    /// Unknown tracks and backgrounds are dropped, volumes clamped and the
    /// mode invariants re-established. Playback always comes back paused.
    pub fn restore(&mut self, saved: PlaybackState) {
        let mut seen = HashSet::new();
        let mut active: Vec<ActiveTrackRef> = saved
            .active_tracks
            .into_iter()
            .filter(|t| self.catalog.contains(&t.track_id) && seen.insert(t.track_id.clone()))
            .map(|t| ActiveTrackRef::new(t.track_id, t.volume))
            .collect();
        let master_volume = clamp_volume(saved.master_volume);

        let current_track = match saved.mode {
            PlaybackMode::Mix => None,
            PlaybackMode::Single => {
                let current = saved
                    .current_track
                    .filter(|id| self.catalog.contains(id))
                    .or_else(|| active.first().map(|t| t.track_id.clone()));
                active = current
                    .iter()
                    .map(|id| ActiveTrackRef::new(id, master_volume))
                    .collect();
                current
            }
        };

        let selected = if self.catalog.background(&saved.background.selected).is_some() {
            saved.background.selected
        } else {
            self.state.background.selected.clone()
        };

        self.state = PlaybackState {
            mode: saved.mode,
            is_playing: false,
            current_track,
            active_tracks: active,
            master_volume,
            background: BackgroundState {
                selected,
                follow_current_track: saved.background.follow_current_track
                    && saved.mode == PlaybackMode::Single,
                displayed: String::new(),
            },
        };
        self.refresh_background();
        debug!(
            "Restored {} playback with {} tracks",
            self.state.mode.as_str(),
            self.state.active_tracks.len()
        );
    }

    /// Stops every output, keeping the active tracks.
    pub fn stop_all(&mut self) {
        self.transport.stop_all();
        self.state.is_playing = false;
    }

    // ========================================================================
    // Transport helpers
    // ========================================================================

    fn stop_active(&mut self) {
        for track in std::mem::take(&mut self.state.active_tracks) {
            self.transport.stop(&track.track_id);
        }
    }

    /// Starts every active track at its stored volume.
    fn play_active(&self) -> PlayerResult {
        let mut first_error = None;
        for entry in &self.state.active_tracks {
            let Some(track) = self.catalog.track(&entry.track_id) else {
                continue;
            };
            if let Err(e) = self.transport.play(track, entry.volume) {
                warn!("Failed to play '{}': {}", entry.track_id, e);
                first_error.get_or_insert(PlayerError::playback(&entry.track_id, e));
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::{MockTransport, TransportCall};
    use crate::types::{BackgroundImage, Category};

    fn test_catalog() -> Arc<Catalog> {
        let tracks = vec![
            Track::new("rain", "Rain", Category::Rain, "cloud-rain", "rain.mp3")
                .with_background("images/rain.jpg"),
            Track::new("fire", "Campfire", Category::Things, "fire", "fire.mp3"),
            Track::new("birds", "Birds", Category::Animals, "bird", "birds.mp3")
                .with_background("images/birds.jpg"),
        ];
        let backgrounds = vec![
            BackgroundImage::new("mountains", "Mountains", "images/mountains.jpg"),
            BackgroundImage::new("ocean", "Ocean", "images/ocean.jpg"),
        ];
        Arc::new(Catalog::new(tracks, backgrounds).unwrap())
    }

    fn create_player() -> (Player, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new());
        let player = Player::new(test_catalog(), transport.clone());
        (player, transport)
    }

    // ------------------------------------------------------------------------
    // Single mode
    // ------------------------------------------------------------------------

    mod single_mode {
        use super::*;

        #[test]
        fn test_activate_plays_track() {
            let (mut player, transport) = create_player();

            player.activate_track("rain").unwrap();

            let state = player.state();
            assert!(state.is_playing);
            assert_eq!(state.current_track.as_deref(), Some("rain"));
            assert_eq!(state.active_tracks, vec![ActiveTrackRef::new("rain", 0.5)]);
            assert!(state.is_consistent());
            assert_eq!(transport.playing_ids(), vec!["rain"]);
        }

        #[test]
        fn test_toggle_law() {
            let (mut player, transport) = create_player();
            let before = player.state().clone();

            player.activate_track("fire").unwrap();
            player.activate_track("fire").unwrap();

            assert_eq!(player.state(), &before);
            assert!(transport.playing_ids().is_empty());
        }

        #[test]
        fn test_activate_other_track_replaces_current() {
            let (mut player, transport) = create_player();
            player.activate_track("rain").unwrap();
            player.activate_track("fire").unwrap();

            assert_eq!(player.state().current_track.as_deref(), Some("fire"));
            assert_eq!(player.state().active_tracks.len(), 1);
            assert_eq!(transport.playing_ids(), vec!["fire"]);
        }

        #[test]
        fn test_activate_paused_current_restarts_it() {
            let (mut player, transport) = create_player();
            player.activate_track("rain").unwrap();
            player.toggle_play_pause().unwrap();

            player.activate_track("rain").unwrap();
            assert!(player.state().is_playing);
            assert_eq!(transport.playing_ids(), vec!["rain"]);
        }

        #[test]
        fn test_unknown_track_is_noop() {
            let (mut player, transport) = create_player();
            let before = player.state().clone();

            assert!(player.activate_track("nope").is_ok());
            assert_eq!(player.state(), &before);
            assert!(transport.calls().is_empty());
        }

        #[test]
        fn test_playback_failure_keeps_state() {
            let (mut player, transport) = create_player();
            transport.fail_track("rain");

            let error = player.activate_track("rain").unwrap_err();
            assert_eq!(error.track_id(), "rain");
            assert!(player.state().is_playing);
            assert_eq!(player.state().current_track.as_deref(), Some("rain"));
        }
    }

    // ------------------------------------------------------------------------
    // Mix mode
    // ------------------------------------------------------------------------

    mod mix_mode {
        use super::*;

        #[test]
        fn test_add_and_remove_tracks() {
            let (mut player, transport) = create_player();
            player.set_mode(PlaybackMode::Mix);

            player.activate_track("rain").unwrap();
            player.activate_track("birds").unwrap();
            assert_eq!(player.state().active_ids(), vec!["rain", "birds"]);
            assert!(player.state().current_track.is_none());
            assert!(player.state().is_playing);
            assert_eq!(transport.playing_ids(), vec!["birds", "rain"]);

            player.activate_track("rain").unwrap();
            assert_eq!(player.state().active_ids(), vec!["birds"]);
            assert_eq!(transport.playing_ids(), vec!["birds"]);

            player.activate_track("birds").unwrap();
            assert!(player.state().active_tracks.is_empty());
            assert!(!player.state().is_playing);
        }

        #[test]
        fn test_track_volume() {
            let (mut player, transport) = create_player();
            player.set_mode(PlaybackMode::Mix);
            player.activate_track("rain").unwrap();

            player.set_track_volume("rain", 0.8);
            assert_eq!(player.state().active_track("rain").unwrap().volume, 0.8);
            assert_eq!(transport.volume("rain"), Some(0.8));

            player.set_track_volume("rain", 3.0);
            assert_eq!(player.state().active_track("rain").unwrap().volume, 1.0);
        }

        #[test]
        fn test_track_volume_inactive_is_noop() {
            let (mut player, transport) = create_player();
            player.set_track_volume("rain", 0.8);
            assert!(player.state().active_tracks.is_empty());
            assert!(transport.calls().is_empty());
        }

        #[test]
        fn test_master_volume_leaves_mix_volumes() {
            let (mut player, _transport) = create_player();
            player.set_mode(PlaybackMode::Mix);
            player.activate_track("rain").unwrap();
            player.set_track_volume("rain", 0.2);

            player.set_master_volume(0.9);
            assert_eq!(player.state().active_track("rain").unwrap().volume, 0.2);

            player.activate_track("fire").unwrap();
            assert_eq!(player.state().active_track("fire").unwrap().volume, 0.9);
        }

        #[test]
        fn test_adding_to_paused_mix_resumes_all() {
            let (mut player, transport) = create_player();
            player.set_mode(PlaybackMode::Mix);
            player.activate_track("rain").unwrap();
            player.toggle_play_pause().unwrap();
            assert!(transport.playing_ids().is_empty());

            player.activate_track("fire").unwrap();
            assert!(player.state().is_playing);
            assert_eq!(transport.playing_ids(), vec!["fire", "rain"]);
        }
    }

    // ------------------------------------------------------------------------
    // Play/pause, mode switching and volume
    // ------------------------------------------------------------------------

    mod commands {
        use super::*;

        #[test]
        fn test_toggle_play_pause() {
            let (mut player, transport) = create_player();
            player.set_mode(PlaybackMode::Mix);
            player.activate_track("rain").unwrap();
            player.activate_track("fire").unwrap();
            player.set_track_volume("fire", 0.3);

            player.toggle_play_pause().unwrap();
            assert!(!player.state().is_playing);
            assert!(transport.playing_ids().is_empty());

            transport.clear_calls();
            player.toggle_play_pause().unwrap();
            assert!(player.state().is_playing);
            assert!(transport.calls().contains(&TransportCall::Play {
                track_id: "fire".to_string(),
                volume: 0.3
            }));
        }

        #[test]
        fn test_toggle_from_empty_plays_first_track() {
            let (mut player, transport) = create_player();
            player.toggle_play_pause().unwrap();

            assert_eq!(player.state().current_track.as_deref(), Some("rain"));
            assert!(player.state().is_playing);
            assert_eq!(transport.playing_ids(), vec!["rain"]);
        }

        #[test]
        fn test_mode_switch_is_lossless_for_one_track() {
            let (mut player, _transport) = create_player();
            player.activate_track("birds").unwrap();

            player.set_mode(PlaybackMode::Mix);
            assert!(player.state().current_track.is_none());
            assert_eq!(player.state().active_ids(), vec!["birds"]);
            assert!(player.state().is_consistent());

            player.set_mode(PlaybackMode::Single);
            assert_eq!(player.state().current_track.as_deref(), Some("birds"));
            assert!(player.state().is_playing);
            assert!(player.state().is_consistent());
        }

        #[test]
        fn test_mix_to_single_keeps_first() {
            let (mut player, transport) = create_player();
            player.set_mode(PlaybackMode::Mix);
            player.activate_track("fire").unwrap();
            player.activate_track("rain").unwrap();
            player.set_track_volume("fire", 0.9);

            player.set_mode(PlaybackMode::Single);
            let state = player.state();
            assert_eq!(state.current_track.as_deref(), Some("fire"));
            assert_eq!(state.active_tracks, vec![ActiveTrackRef::new("fire", 0.5)]);
            assert_eq!(transport.playing_ids(), vec!["fire"]);
            assert_eq!(transport.volume("fire"), Some(0.5));
        }

        #[test]
        fn test_set_mode_idempotent() {
            let (mut player, transport) = create_player();
            player.activate_track("rain").unwrap();
            transport.clear_calls();
            let before = player.state().clone();

            player.set_mode(PlaybackMode::Single);
            assert_eq!(player.state(), &before);
            assert!(transport.calls().is_empty());
        }

        #[test]
        fn test_master_volume_clamps() {
            let (mut player, _transport) = create_player();
            for v in [0.0, 0.25, 0.5, 1.0] {
                player.set_master_volume(v);
                assert_eq!(player.state().master_volume, v);
            }
            player.set_master_volume(-1.0);
            assert_eq!(player.state().master_volume, 0.0);
            player.set_master_volume(1.5);
            assert_eq!(player.state().master_volume, 1.0);
        }

        #[test]
        fn test_master_volume_applies_in_single_mode() {
            let (mut player, transport) = create_player();
            player.activate_track("rain").unwrap();

            player.set_master_volume(0.8);
            assert_eq!(player.state().active_track("rain").unwrap().volume, 0.8);
            assert_eq!(transport.volume("rain"), Some(0.8));
        }
    }

    // ------------------------------------------------------------------------
    // Background
    // ------------------------------------------------------------------------

    mod background {
        use super::*;

        #[test]
        fn test_default_background() {
            let (player, _transport) = create_player();
            assert_eq!(player.state().background.selected, "mountains");
            assert_eq!(player.state().background.displayed, "images/mountains.jpg");
        }

        #[test]
        fn test_set_background_clears_follow() {
            let (mut player, _transport) = create_player();
            player.toggle_follow_current_track();

            player.set_background("ocean");
            let background = &player.state().background;
            assert_eq!(background.selected, "ocean");
            assert!(!background.follow_current_track);
            assert_eq!(background.displayed, "images/ocean.jpg");
        }

        #[test]
        fn test_unknown_background_is_noop() {
            let (mut player, _transport) = create_player();
            player.set_background("moon");
            assert_eq!(player.state().background.selected, "mountains");
        }

        #[test]
        fn test_follow_current_track() {
            let (mut player, _transport) = create_player();
            player.toggle_follow_current_track();
            player.activate_track("rain").unwrap();
            assert_eq!(player.state().background.displayed, "images/rain.jpg");

            // A track without its own image falls back to the selection
            player.activate_track("fire").unwrap();
            assert_eq!(player.state().background.displayed, "images/mountains.jpg");

            player.activate_track("birds").unwrap();
            player.toggle_follow_current_track();
            assert_eq!(player.state().background.displayed, "images/mountains.jpg");
        }

        #[test]
        fn test_follow_turned_on_with_current_track() {
            let (mut player, _transport) = create_player();
            player.activate_track("birds").unwrap();
            player.toggle_follow_current_track();
            assert_eq!(player.state().background.displayed, "images/birds.jpg");
        }

        #[test]
        fn test_mix_mode_disables_follow() {
            let (mut player, _transport) = create_player();
            player.toggle_follow_current_track();
            player.activate_track("rain").unwrap();

            player.set_mode(PlaybackMode::Mix);
            assert!(!player.state().background.follow_current_track);
            assert_eq!(player.state().background.displayed, "images/mountains.jpg");
        }
    }

    // ------------------------------------------------------------------------
    // load_mix / restore
    // ------------------------------------------------------------------------

    mod bulk {
        use super::*;

        #[test]
        fn test_load_mix_drops_unknown_tracks() {
            let (mut player, transport) = create_player();
            player.activate_track("rain").unwrap();

            let entries = vec![
                MixEntry::new("fire", 0.3),
                MixEntry::new("deleted", 0.4),
                MixEntry::new("birds", 0.7),
            ];
            let dropped = player.load_mix(&entries, Some("ocean"));

            assert_eq!(dropped, 1);
            let state = player.state();
            assert_eq!(state.mode, PlaybackMode::Mix);
            assert!(!state.is_playing);
            assert!(state.current_track.is_none());
            assert_eq!(
                state.active_tracks,
                vec![ActiveTrackRef::new("fire", 0.3), ActiveTrackRef::new("birds", 0.7)]
            );
            assert_eq!(state.background.selected, "ocean");
            assert!(transport.playing_ids().is_empty());
        }

        #[test]
        fn test_load_mix_keeps_background_when_missing() {
            let (mut player, _transport) = create_player();
            player.load_mix(&[MixEntry::new("fire", 0.3)], Some("moon"));
            assert_eq!(player.state().background.selected, "mountains");
        }

        #[test]
        fn test_restore_does_not_play() {
            let (mut player, transport) = create_player();
            let saved = PlaybackState {
                mode: PlaybackMode::Mix,
                is_playing: true,
                current_track: Some("rain".to_string()),
                active_tracks: vec![
                    ActiveTrackRef::new("rain", 0.4),
                    ActiveTrackRef::new("gone", 0.4),
                    ActiveTrackRef::new("rain", 0.9),
                ],
                master_volume: 0.7,
                background: BackgroundState {
                    selected: "ocean".to_string(),
                    follow_current_track: true,
                    displayed: String::new(),
                },
            };

            player.restore(saved);

            let state = player.state();
            assert!(!state.is_playing);
            assert!(state.current_track.is_none());
            assert_eq!(state.active_tracks, vec![ActiveTrackRef::new("rain", 0.4)]);
            assert_eq!(state.master_volume, 0.7);
            assert!(!state.background.follow_current_track);
            assert_eq!(state.background.displayed, "images/ocean.jpg");
            assert!(state.is_consistent());
            assert!(transport.calls().is_empty());
        }

        #[test]
        fn test_restore_single_rebuilds_active_entry() {
            let (mut player, _transport) = create_player();
            let saved = PlaybackState {
                current_track: Some("birds".to_string()),
                master_volume: 0.3,
                ..PlaybackState::default()
            };

            player.restore(saved);
            assert_eq!(player.state().active_tracks, vec![ActiveTrackRef::new("birds", 0.3)]);
            assert!(player.state().is_consistent());
        }

        #[test]
        fn test_stop_all() {
            let (mut player, transport) = create_player();
            player.activate_track("rain").unwrap();
            player.stop_all();

            assert!(!player.state().is_playing);
            assert_eq!(player.state().current_track.as_deref(), Some("rain"));
            assert_eq!(transport.calls().last(), Some(&TransportCall::StopAll));
        }
    }
}
