//! Integration tests for the ambience session.
//!
//! These tests drive a `Session` through its public API with in-memory
//! stores and mock audio/notification collaborators:
//! - Playback toggle, volume and mode laws
//! - Timer round trips and time adjustments
//! - Saved mixes, share links and bootstrap
//! - Persistence across sessions
//! - The tick loop under a paused tokio clock

use std::sync::Arc;
use std::time::Duration;

use ambience::share::{self, SharedMix};
use ambience::storage::keys;
use ambience::{
    Catalog, MemoryMixStore, MemoryPreferenceStore, MixEntry, MockChimePlayer, MockNotifier,
    MockTransport, Notice, PlaybackMode, PreferenceStore, SavedMix, Services, Session,
    SessionChannels, SessionOptions, TimerPhase,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct Fixture {
    session: Session,
    channels: SessionChannels,
    transport: Arc<MockTransport>,
    chime: Arc<MockChimePlayer>,
    preferences: MemoryPreferenceStore,
    mixes: MemoryMixStore,
}

impl Fixture {
    fn notices(&mut self) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = self.channels.notices.try_recv() {
            notices.push(notice);
        }
        notices
    }

    fn ticks(&mut self, count: u32) {
        for _ in 0..count {
            self.session.tick();
        }
    }
}

fn fixture_with(preferences: MemoryPreferenceStore, mixes: MemoryMixStore) -> Fixture {
    let transport = Arc::new(MockTransport::new());
    let chime = Arc::new(MockChimePlayer::new());
    let services = Services {
        catalog: Arc::new(Catalog::default()),
        transport: transport.clone(),
        chime: chime.clone(),
        notifier: Arc::new(MockNotifier::granted()),
        preferences: Arc::new(preferences.clone()),
        mixes: Arc::new(mixes.clone()),
    };
    let (session, channels) = Session::new(services, SessionOptions::default());
    Fixture {
        session,
        channels,
        transport,
        chime,
        preferences,
        mixes,
    }
}

fn fixture() -> Fixture {
    fixture_with(MemoryPreferenceStore::new(), MemoryMixStore::new())
}

// ============================================================================
// Playback
// ============================================================================

#[test]
fn test_single_mode_toggle_law() {
    let mut f = fixture();
    let before = f.session.playback().clone();

    f.session.activate_track("forest");
    assert!(f.session.playback().is_playing);
    assert!(f.transport.is_playing("forest"));

    f.session.activate_track("forest");
    let after = f.session.playback();
    assert!(!after.is_playing);
    assert_eq!(after.current_track, before.current_track);
    assert_eq!(after.active_tracks, before.active_tracks);
    assert!(!f.transport.is_playing("forest"));
}

#[test]
fn test_master_volume_is_clamped() {
    let mut f = fixture();

    for volume in [0.0, 0.37, 1.0] {
        f.session.set_master_volume(volume);
        assert_eq!(f.session.playback().master_volume, volume);
    }

    f.session.set_master_volume(1.5);
    assert_eq!(f.session.playback().master_volume, 1.0);
    f.session.set_master_volume(-0.2);
    assert_eq!(f.session.playback().master_volume, 0.0);
}

#[test]
fn test_mode_round_trip_keeps_single_track() {
    let mut f = fixture();
    f.session.activate_track("rain");

    f.session.set_mode(PlaybackMode::Mix);
    assert!(f.session.playback().current_track.is_none());
    f.session.set_mode(PlaybackMode::Single);

    assert_eq!(f.session.playback().current_track.as_deref(), Some("rain"));
    assert!(f.session.playback().is_consistent());
}

#[test]
fn test_playback_failure_is_reported_not_rolled_back() {
    let mut f = fixture();
    f.transport.fail_track("cafe");

    f.session.activate_track("cafe");

    assert!(f.session.playback().is_playing);
    assert_eq!(f.session.playback().current_track.as_deref(), Some("cafe"));
    let notices = f.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].is_error());
}

// ============================================================================
// Timer
// ============================================================================

#[test]
fn test_timer_round_trip() {
    let mut f = fixture();
    f.session.start_timer(1500, "", 300, 4).unwrap();

    f.ticks(1500);
    assert_eq!(f.session.timer().phase, TimerPhase::Break);
    assert_eq!(f.session.timer().remaining, 300);

    f.ticks(300);
    assert_eq!(f.session.timer().current_round, 1);
    assert_eq!(f.session.timer().phase, TimerPhase::Focus);
    assert_eq!(f.session.timer().remaining, 1500);

    f.ticks(3 * 1800);
    let timer = f.session.timer();
    assert!(!timer.is_active);
    assert_eq!(timer.remaining, 0);
    assert_eq!(timer.completed_rounds, 4);

    // One chime per phase end
    assert_eq!(f.chime.play_count(), 8);
    assert!(f.notices().iter().any(|n| n.message == "Timer finished"));
}

#[test]
fn test_add_minutes_in_either_phase() {
    let mut f = fixture();
    f.session.start_timer(120, "", 60, 2).unwrap();

    f.ticks(20);
    f.session.add_minutes_to_timer(10);
    assert_eq!(f.session.timer().remaining, 100 + 600);

    f.ticks(700);
    assert_eq!(f.session.timer().phase, TimerPhase::Break);
    f.session.add_minutes_to_timer(10);
    assert_eq!(f.session.timer().remaining, 60 + 600);
}

#[test]
fn test_reset_to_empty_break_ends_on_next_tick() {
    let mut f = fixture();
    f.session.start_timer(300, "Reading", 0, 1).unwrap();

    f.session.reset_timer(Some(TimerPhase::Break));
    assert_eq!(f.session.timer().phase, TimerPhase::Break);
    assert_eq!(f.session.timer().remaining, 0);
    assert!(f.session.timer().is_active);

    let completion = f.session.tick().unwrap();
    assert!(completion.is_finished());
    assert!(!f.session.timer().is_active);
}

#[test]
fn test_invalid_rounds_rejected() {
    let mut f = fixture();
    assert!(f.session.start_timer(1500, "", 300, 0).is_err());
    assert!(f.session.start_timer(1500, "", 300, 11).is_err());
    assert!(!f.session.timer().is_active);
    assert_eq!(f.notices().len(), 2);
}

// ============================================================================
// Mixes
// ============================================================================

#[test]
fn test_share_round_trip_volumes() {
    let mut f = fixture();
    f.session.set_mode(PlaybackMode::Mix);
    for id in ["rain", "wind", "birds"] {
        f.session.activate_track(id);
    }
    f.session.set_track_volume("rain", 0.2);
    f.session.set_track_volume("wind", 0.55);
    f.session.set_track_volume("birds", 1.0);
    let mix = f.session.save_mix(Some("Morning")).unwrap();

    let url = f.session.share_mix(&mix.id).unwrap();
    let token = share::token_from_url(&url).unwrap();
    let decoded = share::decode(&token).unwrap();

    let ids: Vec<&str> = decoded.tracks.iter().map(|t| t.track_id.as_str()).collect();
    assert_eq!(ids, vec!["rain", "wind", "birds"]);
    for (expected, entry) in [0.2_f32, 0.55, 1.0].iter().zip(&decoded.tracks) {
        assert!((expected - entry.volume).abs() < 0.01);
    }
    assert!(decoded.autoplay);
}

#[test]
fn test_delete_unknown_mix_is_idempotent() {
    let existing = SavedMix::new("Night", vec![MixEntry::new("crickets", 0.5)], None);
    let mut f = fixture_with(
        MemoryPreferenceStore::new(),
        MemoryMixStore::with_mixes(vec![existing.clone()]),
    );

    f.session.delete_mix("no-such-id");

    assert_eq!(f.session.mixes(), &[existing]);
    assert_eq!(f.mixes.write_count(), 0);
    assert!(f.notices().is_empty());
}

#[test]
fn test_load_mix_skips_removed_tracks() {
    let mix = SavedMix::new(
        "Old",
        vec![
            MixEntry::new("rain", 0.4),
            MixEntry::new("retired-track", 0.9),
            MixEntry::new("train", 0.6),
        ],
        Some("retired-background".to_string()),
    );
    let id = mix.id.clone();
    let mut f = fixture_with(MemoryPreferenceStore::new(), MemoryMixStore::with_mixes(vec![mix]));

    f.session.load_mix(&id).unwrap();

    let playback = f.session.playback();
    assert_eq!(playback.mode, PlaybackMode::Mix);
    assert_eq!(playback.active_ids(), vec!["rain", "train"]);
    assert!(!playback.is_playing);
    assert!(f.notices().iter().all(|n| !n.is_error()));
}

#[test]
fn test_save_empty_mix_is_an_error() {
    let mut f = fixture();
    assert!(f.session.save_mix(None).is_none());
    assert!(f.notices()[0].is_error());
    assert_eq!(f.mixes.write_count(), 0);
}

// ============================================================================
// Bootstrap and persistence
// ============================================================================

#[test]
fn test_bootstrap_with_shared_mix() {
    let mut f = fixture();
    let shared = SharedMix {
        name: "Storm".to_string(),
        tracks: vec![MixEntry::new("thunder", 0.8), MixEntry::new("rain", 0.5)],
        background: Some("night".to_string()),
        autoplay: true,
        created_at: chrono::Utc::now(),
    };
    let url = share::share_url("https://ambience.app/?lang=en", &share::encode(&shared)).unwrap();

    let outcome = f.session.bootstrap(&url);

    assert!(outcome.loaded);
    assert_eq!(outcome.cleaned_url, "https://ambience.app/?lang=en");
    assert_eq!(outcome.autoplay_after, Some(Duration::from_millis(500)));
    assert_eq!(f.session.playback().active_ids(), vec!["thunder", "rain"]);
    assert_eq!(f.session.playback().background.selected, "night");

    f.session.autoplay();
    assert!(f.transport.is_playing("thunder"));
    assert!(f.transport.is_playing("rain"));
}

#[test]
fn test_bootstrap_with_damaged_token_keeps_state() {
    let mut f = fixture();
    f.session.activate_track("river");
    let before = f.session.playback().clone();

    let outcome = f.session.bootstrap("https://ambience.app/?mix=***");

    assert!(!outcome.loaded);
    assert_eq!(f.session.playback(), &before);
    assert!(f.notices().iter().any(Notice::is_error));
}

#[test]
fn test_state_survives_restart_paused() {
    let preferences = MemoryPreferenceStore::new();
    {
        let mut f = fixture_with(preferences.clone(), MemoryMixStore::new());
        f.session.set_mode(PlaybackMode::Mix);
        f.session.activate_track("cafe");
        f.session.activate_track("keyboard");
        f.session.set_track_volume("keyboard", 0.3);
        f.session.set_background("forest");
        f.session.set_hide_seconds(true);
        assert!(f.session.playback().is_playing);
    }

    let mut f = fixture_with(preferences, MemoryMixStore::new());
    f.session.restore();

    let playback = f.session.playback();
    assert_eq!(playback.mode, PlaybackMode::Mix);
    assert_eq!(playback.active_ids(), vec!["cafe", "keyboard"]);
    assert_eq!(playback.active_track("keyboard").unwrap().volume, 0.3);
    assert_eq!(playback.background.selected, "forest");
    assert!(!playback.is_playing);
    assert!(f.session.timer().preferences.hide_seconds);
    assert!(f.transport.playing_ids().is_empty());
}

#[test]
fn test_corrupt_preferences_fall_back_to_defaults() {
    let preferences = MemoryPreferenceStore::new();
    preferences.set(keys::ACTIVE_TRACKS, "not json", Some(30)).unwrap();
    preferences.set(keys::MIX_MODE, "true", Some(30)).unwrap();

    let mut f = fixture_with(preferences, MemoryMixStore::new());
    f.session.restore();

    assert_eq!(f.session.playback().mode, PlaybackMode::Mix);
    assert!(f.session.playback().active_tracks.is_empty());
    assert!(f.preferences.get(keys::MIX_MODE).is_some());
}

// ============================================================================
// Tick loop
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_tick_loop_drives_timer_to_completion() {
    let mut f = fixture();
    f.session.start_timer(3, "", 0, 1).unwrap();
    assert!(f.session.has_tick_loop());

    let mut completions = Vec::new();
    while f.session.timer().is_active {
        let generation = f.channels.ticks.recv().await.unwrap();
        if let Some(completion) = f.session.handle_tick(generation) {
            completions.push(completion);
        }
    }

    assert_eq!(completions.len(), 1);
    assert!(completions[0].is_finished());
    assert!(!f.session.has_tick_loop());
}

#[tokio::test(start_paused = true)]
async fn test_restarting_timer_keeps_one_loop() {
    let mut f = fixture();
    f.session.start_timer(60, "", 0, 1).unwrap();
    f.session.start_timer(60, "", 0, 1).unwrap();

    tokio::time::sleep(Duration::from_millis(2500)).await;

    let mut received = 0;
    while f.channels.ticks.try_recv().is_ok() {
        received += 1;
    }
    assert_eq!(received, 2);
}

/// Delivers every queued tick to the session.
fn deliver_ticks(f: &mut Fixture) -> usize {
    let mut delivered = 0;
    while let Ok(generation) = f.channels.ticks.try_recv() {
        f.session.handle_tick(generation);
        delivered += 1;
    }
    delivered
}

#[tokio::test(start_paused = true)]
async fn test_ticks_from_replaced_loop_are_ignored() {
    let mut f = fixture();
    f.session.start_timer(60, "", 0, 1).unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    f.session.start_timer(10, "", 0, 1).unwrap();

    assert_eq!(deliver_ticks(&mut f), 1);
    assert_eq!(f.session.timer().remaining, 10);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_queued_before_reset_are_ignored() {
    let mut f = fixture();
    f.session.start_timer(60, "", 30, 2).unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    f.session.reset_timer(Some(TimerPhase::Break));

    assert_eq!(deliver_ticks(&mut f), 1);
    assert_eq!(f.session.timer().phase, TimerPhase::Break);
    assert_eq!(f.session.timer().remaining, 30);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert_eq!(deliver_ticks(&mut f), 1);
    assert_eq!(f.session.timer().remaining, 29);
}
