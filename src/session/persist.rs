//! Snapshots of session state in the preference store.
//!
//! Each playback key is written and read on its own, so one missing or
//! corrupt value only costs that value.

use std::collections::BTreeMap;

use tracing::debug;

use crate::storage::{keys, read_json, write_json, PreferenceStore, StorageError};
use crate::types::{
    clamp_volume, ActiveTrackRef, BackgroundState, PlaybackMode, PlaybackState, TimerPreferences,
};

/// Writes every playback key with the given lifetime.
pub(crate) fn save_playback(
    store: &dyn PreferenceStore,
    state: &PlaybackState,
    ttl_days: u32,
) -> Result<(), StorageError> {
    let ttl = Some(ttl_days);

    match &state.current_track {
        Some(track_id) => write_json(store, keys::CURRENT_TRACK, track_id, ttl)?,
        None => store.delete(keys::CURRENT_TRACK)?,
    }
    write_json(store, keys::MASTER_VOLUME, &state.master_volume, ttl)?;
    write_json(store, keys::IS_PLAYING, &state.is_playing, ttl)?;
    write_json(store, keys::MIX_MODE, &(state.mode == PlaybackMode::Mix), ttl)?;
    write_json(store, keys::ACTIVE_TRACKS, &state.active_ids(), ttl)?;

    let volumes: BTreeMap<&str, f32> = state
        .active_tracks
        .iter()
        .map(|t| (t.track_id.as_str(), t.volume))
        .collect();
    write_json(store, keys::TRACK_VOLUMES, &volumes, ttl)?;

    write_json(store, keys::BACKGROUND, &state.background.selected, ttl)?;
    write_json(
        store,
        keys::FOLLOW_CURRENT_TRACK,
        &state.background.follow_current_track,
        ttl,
    )?;
    Ok(())
}

/// Rebuilds a playback state from the stored keys.
///
/// Absent values take their defaults. The result still has to go through
/// `Player::restore`, which checks it against the catalog.
pub(crate) fn load_playback(store: &dyn PreferenceStore, default_volume: f32) -> PlaybackState {
    let mix_mode: bool = read_json(store, keys::MIX_MODE).unwrap_or(false);
    let master_volume = read_json::<f32>(store, keys::MASTER_VOLUME)
        .map(clamp_volume)
        .unwrap_or(default_volume);
    let current_track: Option<String> = read_json(store, keys::CURRENT_TRACK);
    let active_ids: Vec<String> = read_json(store, keys::ACTIVE_TRACKS).unwrap_or_default();
    let volumes: BTreeMap<String, f32> =
        read_json(store, keys::TRACK_VOLUMES).unwrap_or_default();
    let was_playing: bool = read_json(store, keys::IS_PLAYING).unwrap_or(false);

    let active_tracks = active_ids
        .into_iter()
        .map(|id| {
            let volume = volumes.get(&id).copied().unwrap_or(master_volume);
            ActiveTrackRef::new(id, volume)
        })
        .collect();

    debug!("Stored playback was playing: {}", was_playing);

    PlaybackState {
        mode: if mix_mode {
            PlaybackMode::Mix
        } else {
            PlaybackMode::Single
        },
        is_playing: false,
        current_track,
        active_tracks,
        master_volume,
        background: BackgroundState {
            selected: read_json(store, keys::BACKGROUND).unwrap_or_default(),
            follow_current_track: read_json(store, keys::FOLLOW_CURRENT_TRACK).unwrap_or(false),
            displayed: String::new(),
        },
    }
}

/// Writes the timer preference record. It never expires.
pub(crate) fn save_timer_preferences(
    store: &dyn PreferenceStore,
    preferences: &TimerPreferences,
) -> Result<(), StorageError> {
    write_json(store, keys::TIMER_PREFERENCES, preferences, None)
}

pub(crate) fn load_timer_preferences(store: &dyn PreferenceStore) -> TimerPreferences {
    read_json(store, keys::TIMER_PREFERENCES).unwrap_or_default()
}
