//! Share token encoding and decoding.

use std::collections::HashSet;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{clamp_volume, MixEntry, SavedMix};

/// Envelope format version written into every token.
pub const TOKEN_VERSION: u8 = 1;

/// Longest mix name kept when decoding.
pub const MAX_NAME_LENGTH: usize = 100;

const FALLBACK_NAME: &str = "Shared Mix";

/// Wire shape of a token, kept short on purpose since it lives in a URL.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    t: Vec<(String, f32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    b: Option<String>,
    #[serde(default)]
    n: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    p: bool,
}

/// A mix as carried by a share token.
#[derive(Debug, Clone, PartialEq)]
pub struct SharedMix {
    pub name: String,
    pub tracks: Vec<MixEntry>,
    pub background: Option<String>,
    /// Start playback as soon as the mix is loaded
    pub autoplay: bool,
    /// Regenerated on decode; shared mixes are synthesized, not restored
    pub created_at: DateTime<Utc>,
}

impl SharedMix {
    /// Builds a shareable mix from a saved one.
    pub fn from_saved(mix: &SavedMix, autoplay: bool) -> Self {
        Self {
            name: mix.name.clone(),
            tracks: mix.tracks.clone(),
            background: mix.background.clone(),
            autoplay,
            created_at: mix.created_at,
        }
    }

    /// Converts into a saved mix with a fresh id.
    pub fn into_saved(self) -> SavedMix {
        let mut saved = SavedMix::new(self.name, self.tracks, self.background);
        saved.created_at = self.created_at;
        saved
    }
}

fn round_volume(volume: f32) -> f32 {
    (clamp_volume(volume) * 100.0).round() / 100.0
}

/// Encodes a mix into a URL-safe token.
///
/// Volumes are rounded to two decimal places.
pub fn encode(mix: &SharedMix) -> String {
    let envelope = Envelope {
        v: TOKEN_VERSION,
        t: mix
            .tracks
            .iter()
            .map(|e| (e.track_id.clone(), round_volume(e.volume)))
            .collect(),
        b: mix.background.clone(),
        n: mix.name.clone(),
        p: mix.autoplay,
    };

    // Serializing plain strings, numbers and bools cannot fail.
    let json = serde_json::to_vec(&envelope).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decodes a token produced by [`encode`].
///
/// Returns `None` for anything malformed: bad base64, bad JSON, an unknown
/// version, or a mix without tracks. Volumes are clamped, duplicate tracks
/// are dropped, and the creation time is set to now.
pub fn decode(token: &str) -> Option<SharedMix> {
    let token = token.trim().trim_end_matches('=');
    if token.is_empty() {
        return None;
    }

    let bytes = match URL_SAFE_NO_PAD.decode(token) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Share token is not base64url: {}", e);
            return None;
        }
    };

    let envelope: Envelope = match serde_json::from_slice(&bytes) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!("Share token payload is not a mix: {}", e);
            return None;
        }
    };

    if envelope.v != TOKEN_VERSION {
        debug!("Unsupported share token version {}", envelope.v);
        return None;
    }

    let mut seen = HashSet::new();
    let tracks: Vec<MixEntry> = envelope
        .t
        .into_iter()
        .filter(|(id, _)| !id.is_empty() && seen.insert(id.clone()))
        .map(|(id, volume)| MixEntry::new(id, volume))
        .collect();

    if tracks.is_empty() {
        debug!("Share token carries no tracks");
        return None;
    }

    let name = envelope.n.trim();
    let name = if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name.chars().take(MAX_NAME_LENGTH).collect()
    };

    Some(SharedMix {
        name,
        tracks,
        background: envelope.b.filter(|b| !b.is_empty()),
        autoplay: envelope.p,
        created_at: Utc::now(),
    })
}
