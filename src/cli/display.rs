//! Output formatting for the CLI.
//!
//! `format_*` functions build the text; `show_*` print it.

use crate::catalog::Catalog;
use crate::session::Notice;
use crate::share::SharedMix;
use crate::timer::{PhaseCompletion, TimerEvent};
use crate::types::{Category, MixEntry, PlaybackMode, PlaybackState, SavedMix, TimerState};

/// Display helper for CLI output.
pub struct Display;

impl Display {
    // ========================================================================
    // Catalog
    // ========================================================================

    /// Formats the catalog grouped by category, optionally filtered.
    pub fn format_tracks(catalog: &Catalog, only: Option<Category>) -> String {
        let mut out = String::new();
        for category in Category::ALL {
            if only.is_some_and(|c| c != category) {
                continue;
            }
            let tracks: Vec<_> = catalog.by_category(category).collect();
            if tracks.is_empty() {
                continue;
            }
            out.push_str(&format!("{}:\n", category.as_str()));
            for track in tracks {
                out.push_str(&format!("  {:<16} {}\n", track.id, track.name));
            }
        }
        if out.is_empty() {
            out.push_str("No tracks\n");
        }
        out
    }

    pub fn show_tracks(catalog: &Catalog, only: Option<Category>) {
        print!("{}", Self::format_tracks(catalog, only));
    }

    // ========================================================================
    // Mixes
    // ========================================================================

    fn format_entries(entries: &[MixEntry]) -> String {
        entries
            .iter()
            .map(|e| format!("{} {:.0}%", e.track_id, e.volume * 100.0))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Formats saved mixes, one per line.
    pub fn format_mixes(mixes: &[SavedMix]) -> String {
        if mixes.is_empty() {
            return "No saved mixes\n".to_string();
        }
        let mut out = String::new();
        for mix in mixes {
            out.push_str(&format!(
                "{}  {:<20} {}\n",
                mix.id,
                mix.name,
                Self::format_entries(&mix.tracks)
            ));
        }
        out
    }

    pub fn show_mixes(mixes: &[SavedMix]) {
        print!("{}", Self::format_mixes(mixes));
    }

    /// Formats a decoded share token.
    pub fn format_shared(mix: &SharedMix) -> String {
        let mut out = format!("Mix: {}\n", mix.name);
        for entry in &mix.tracks {
            out.push_str(&format!("  {:<16} {:.0}%\n", entry.track_id, entry.volume * 100.0));
        }
        if let Some(background) = &mix.background {
            out.push_str(&format!("Background: {}\n", background));
        }
        out.push_str(&format!(
            "Autoplay: {}\n",
            if mix.autoplay { "yes" } else { "no" }
        ));
        out
    }

    pub fn show_shared(mix: &SharedMix) {
        print!("{}", Self::format_shared(mix));
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// One-line playback summary.
    pub fn format_playback(state: &PlaybackState) -> String {
        let status = if state.is_playing { "▶" } else { "⏸" };
        let tracks = match state.mode {
            PlaybackMode::Single => state
                .current_track
                .clone()
                .unwrap_or_else(|| "-".to_string()),
            PlaybackMode::Mix if state.active_tracks.is_empty() => "-".to_string(),
            PlaybackMode::Mix => state
                .active_tracks
                .iter()
                .map(|t| format!("{} {:.0}%", t.track_id, t.volume * 100.0))
                .collect::<Vec<_>>()
                .join(", "),
        };
        format!(
            "{} {} [{}] vol {:.0}%  bg {}",
            status,
            state.mode.as_str(),
            tracks,
            state.master_volume * 100.0,
            state.background.selected
        )
    }

    /// One-line timer summary, or `None` when no timer is active.
    pub fn format_timer(timer: &TimerState) -> Option<String> {
        if !timer.is_active {
            return None;
        }
        let mut line = format!("⏱ {} {}", timer.phase.label(), timer.format_remaining());
        if !timer.is_simple() {
            line.push_str(&format!(
                "  round {}/{}",
                timer.current_round + 1,
                timer.total_rounds
            ));
        }
        if !timer.task.is_empty() {
            line.push_str(&format!("  {}", timer.task));
        }
        if timer.is_paused {
            line.push_str("  (paused)");
        }
        Some(line)
    }

    pub fn show_status(playback: &PlaybackState, timer: &TimerState) {
        println!("{}", Self::format_playback(playback));
        if let Some(line) = Self::format_timer(timer) {
            println!("{}", line);
        }
    }

    // ========================================================================
    // Timer
    // ========================================================================

    /// Line to print for a timer event.
    ///
    /// Ticks only print on whole minutes.
    pub fn format_timer_event(event: &TimerEvent, timer: &TimerState) -> Option<String> {
        match event {
            TimerEvent::Started { task, total_rounds } => Some(if task.is_empty() {
                format!("Timer started ({} rounds)", total_rounds)
            } else {
                format!("Timer started: {} ({} rounds)", task, total_rounds)
            }),
            TimerEvent::Tick { remaining } if *remaining > 0 && remaining % 60 == 0 => {
                Self::format_timer(timer)
            }
            TimerEvent::Tick { .. } => None,
            TimerEvent::PhaseStarted { phase, round } => {
                Some(format!("{} started (round {})", phase.label(), round + 1))
            }
            TimerEvent::Paused => Some("Timer paused".to_string()),
            TimerEvent::Resumed => Some("Timer resumed".to_string()),
            TimerEvent::Reset { phase } => Some(format!("Timer reset to {}", phase.as_str())),
            TimerEvent::TimeAdded { minutes, .. } => {
                Some(format!("Added {} min, {} left", minutes, timer.format_remaining()))
            }
            TimerEvent::Cancelled => Some("Timer cancelled".to_string()),
            TimerEvent::PhaseCompleted { .. } | TimerEvent::Finished { .. } => None,
        }
    }

    pub fn show_timer_event(event: &TimerEvent, timer: &TimerState) {
        if let Some(line) = Self::format_timer_event(event, timer) {
            println!("{}", line);
        }
    }

    /// Formats the end of a phase.
    pub fn format_completion(completion: &PhaseCompletion) -> String {
        match completion.next {
            Some(next) => format!(
                "{} complete. {} time.",
                completion.ended.label(),
                next.label()
            ),
            None => format!("{} complete. All rounds done.", completion.ended.label()),
        }
    }

    pub fn show_completion(completion: &PhaseCompletion) {
        println!("🔔 {}", Self::format_completion(completion));
    }

    // ========================================================================
    // Messages
    // ========================================================================

    pub fn show_notice(notice: &Notice) {
        if notice.is_error() {
            eprintln!("{}", notice);
        } else {
            println!("{}", notice);
        }
    }

    pub fn show_message(message: &str) {
        println!("{}", message);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("error: {}", message);
    }
}
