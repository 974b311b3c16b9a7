//! Line commands for an interactive session.
//!
//! Each line read from stdin is parsed into a [`ReplCommand`] and applied
//! to the [`Session`]. Mix arguments accept an id, a unique id prefix or a
//! name.

use thiserror::Error;
use tracing::trace;

use super::commands::parse_volume;
use super::display::Display;
use crate::session::Session;
use crate::types::{PlaybackMode, SoundKind, TimerPhase};

pub const HELP: &str = "\
Commands:
  toggle | p                     play or pause
  play <track>                   activate a track
  volume <0-1>                   master volume
  volume <track> <0-1>           volume of one track in a mix
  mode single|mix                switch playback mode
  bg <background>                select a background
  follow                         toggle background following the track
  timer <focus> [break] [rounds] [task...]
                                 start a timer (minutes)
  pause                          pause or resume the timer
  reset [focus|break]            restart the run or jump to a phase
  add <minutes>                  add time to the current phase
  cancel                         cancel the timer
  set <option> <value>           hide-seconds|sound|chime|auto-start|notifications
  save [name]                    save the active tracks as a mix
  load <mix>                     load a saved mix
  delete <mix>                   delete a saved mix
  share <mix>                    print the share link of a mix
  mixes                          list saved mixes
  status                         show playback and timer
  help                           show this help
  quit | q                       stop playback and exit";

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while parsing a command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplError {
    #[error("unknown command '{0}' (type 'help')")]
    UnknownCommand(String),

    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("invalid {what}: {value}")]
    InvalidValue { what: &'static str, value: String },
}

impl ReplError {
    fn invalid(what: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            what,
            value: value.into(),
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// A timer preference changed with `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    HideSeconds(bool),
    PlaySound(bool),
    Chime(SoundKind),
    AutoStart(bool),
    Notifications(bool),
}

/// A parsed interactive command.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Toggle,
    Play(String),
    MasterVolume(f32),
    TrackVolume(String, f32),
    Mode(PlaybackMode),
    Background(String),
    Follow,
    StartTimer {
        focus_minutes: u32,
        break_minutes: u32,
        rounds: u32,
        task: String,
    },
    PauseTimer,
    ResetTimer(Option<TimerPhase>),
    AddMinutes(u32),
    CancelTimer,
    Set(Setting),
    Save(Option<String>),
    Load(String),
    Delete(String),
    Share(String),
    Mixes,
    Status,
    Help,
    Quit,
}

/// Whether the session should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ============================================================================
// Parsing
// ============================================================================

fn parse_number<T: std::str::FromStr>(what: &'static str, s: &str) -> Result<T, ReplError> {
    s.parse().map_err(|_| ReplError::invalid(what, s))
}

fn parse_switch(s: &str) -> Result<bool, ReplError> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(ReplError::invalid("switch (use on/off)", s)),
    }
}

fn parse_phase(s: &str) -> Result<TimerPhase, ReplError> {
    match s.to_ascii_lowercase().as_str() {
        "focus" => Ok(TimerPhase::Focus),
        "break" => Ok(TimerPhase::Break),
        _ => Err(ReplError::invalid("phase", s)),
    }
}

fn parse_setting(name: &str, value: &str) -> Result<Setting, ReplError> {
    match name {
        "hide-seconds" => Ok(Setting::HideSeconds(parse_switch(value)?)),
        "sound" => Ok(Setting::PlaySound(parse_switch(value)?)),
        "chime" => match value {
            "beep" => Ok(Setting::Chime(SoundKind::Beep)),
            "bell" => Ok(Setting::Chime(SoundKind::Bell)),
            _ => Err(ReplError::invalid("chime (use beep/bell)", value)),
        },
        "auto-start" => Ok(Setting::AutoStart(parse_switch(value)?)),
        "notifications" => Ok(Setting::Notifications(parse_switch(value)?)),
        _ => Err(ReplError::invalid("option", name)),
    }
}

fn required<'a>(
    arg: Option<&'a str>,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, ReplError> {
    arg.ok_or(ReplError::MissingArgument { command, argument })
}

/// Parses one input line.
///
/// Returns `Ok(None)` for blank lines.
pub fn parse(line: &str) -> Result<Option<ReplCommand>, ReplError> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();
    let first = args.first().copied();
    let rest = || args.get(1..).unwrap_or_default().join(" ");

    let parsed = match command.to_ascii_lowercase().as_str() {
        "toggle" | "p" => ReplCommand::Toggle,
        "play" => ReplCommand::Play(required(first, "play", "a track id")?.to_string()),
        "volume" | "vol" => match args.as_slice() {
            [volume] => ReplCommand::MasterVolume(
                parse_volume(volume).map_err(|_| ReplError::invalid("volume", *volume))?,
            ),
            [track, volume] => ReplCommand::TrackVolume(
                track.to_string(),
                parse_volume(volume).map_err(|_| ReplError::invalid("volume", *volume))?,
            ),
            _ => {
                return Err(ReplError::MissingArgument {
                    command: "volume",
                    argument: "a volume between 0 and 1",
                })
            }
        },
        "mode" => match required(first, "mode", "single or mix")? {
            "single" => ReplCommand::Mode(PlaybackMode::Single),
            "mix" => ReplCommand::Mode(PlaybackMode::Mix),
            other => return Err(ReplError::invalid("mode", other)),
        },
        "bg" | "background" => {
            ReplCommand::Background(required(first, "bg", "a background id")?.to_string())
        }
        "follow" => ReplCommand::Follow,
        "timer" => {
            let focus_minutes =
                parse_number("minutes", required(first, "timer", "focus minutes")?)?;
            let break_minutes = match args.get(1) {
                Some(s) => parse_number("minutes", s)?,
                None => 0,
            };
            let rounds = match args.get(2) {
                Some(s) => parse_number("rounds", s)?,
                None => 1,
            };
            let task = args.get(3..).unwrap_or_default().join(" ");
            ReplCommand::StartTimer {
                focus_minutes,
                break_minutes,
                rounds,
                task,
            }
        }
        "pause" | "resume" => ReplCommand::PauseTimer,
        "reset" => ReplCommand::ResetTimer(first.map(parse_phase).transpose()?),
        "add" => ReplCommand::AddMinutes(parse_number(
            "minutes",
            required(first, "add", "a number of minutes")?,
        )?),
        "cancel" => ReplCommand::CancelTimer,
        "set" => {
            let name = required(first, "set", "an option")?;
            let value = rest();
            if value.is_empty() {
                return Err(ReplError::MissingArgument {
                    command: "set",
                    argument: "a value",
                });
            }
            ReplCommand::Set(parse_setting(name, &value)?)
        }
        "save" => {
            let name = args.join(" ");
            ReplCommand::Save(Some(name).filter(|n| !n.is_empty()))
        }
        "load" => ReplCommand::Load(required(first, "load", "a mix")?.to_string()),
        "delete" => ReplCommand::Delete(required(first, "delete", "a mix")?.to_string()),
        "share" => ReplCommand::Share(required(first, "share", "a mix")?.to_string()),
        "mixes" => ReplCommand::Mixes,
        "status" | "s" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "q" | "exit" => ReplCommand::Quit,
        other => return Err(ReplError::UnknownCommand(other.to_string())),
    };
    Ok(Some(parsed))
}

// ============================================================================
// Execution
// ============================================================================

/// Resolves a mix query to an id, showing an error when nothing matches.
fn resolve_mix(session: &Session, query: &str) -> Option<String> {
    let id = session.library().find(query).map(|mix| mix.id.clone());
    if id.is_none() {
        Display::show_error(&format!("no saved mix matches '{}'", query));
    }
    id
}

/// Applies a command to the session.
pub fn apply(session: &mut Session, command: ReplCommand) -> Flow {
    match command {
        ReplCommand::Toggle => session.toggle_play_pause(),
        ReplCommand::Play(track_id) => {
            if session.catalog().contains(&track_id) {
                session.activate_track(&track_id);
            } else {
                Display::show_error(&format!("unknown track '{}'", track_id));
            }
        }
        ReplCommand::MasterVolume(volume) => session.set_master_volume(volume),
        ReplCommand::TrackVolume(track_id, volume) => session.set_track_volume(&track_id, volume),
        ReplCommand::Mode(mode) => session.set_mode(mode),
        ReplCommand::Background(id) => {
            if session.catalog().background(&id).is_some() {
                session.set_background(&id);
            } else {
                Display::show_error(&format!("unknown background '{}'", id));
            }
        }
        ReplCommand::Follow => session.toggle_follow_current_track(),
        ReplCommand::StartTimer {
            focus_minutes,
            break_minutes,
            rounds,
            task,
        } => {
            // Failures arrive as notices
            if let Err(e) = session.start_timer(
                focus_minutes.saturating_mul(60),
                &task,
                break_minutes.saturating_mul(60),
                rounds,
            ) {
                trace!("Timer not started: {}", e);
            }
        }
        ReplCommand::PauseTimer => session.pause_resume_timer(),
        ReplCommand::ResetTimer(phase) => session.reset_timer(phase),
        ReplCommand::AddMinutes(minutes) => session.add_minutes_to_timer(minutes),
        ReplCommand::CancelTimer => session.cancel_timer(),
        ReplCommand::Set(setting) => match setting {
            Setting::HideSeconds(on) => session.set_hide_seconds(on),
            Setting::PlaySound(on) => session.set_play_sound(on),
            Setting::Chime(kind) => session.set_sound_kind(kind),
            Setting::AutoStart(on) => session.set_auto_start(on),
            Setting::Notifications(on) => session.set_show_notifications(on),
        },
        ReplCommand::Save(name) => {
            session.save_mix(name.as_deref());
        }
        ReplCommand::Load(query) => {
            if let Some(id) = resolve_mix(session, &query) {
                if let Err(e) = session.load_mix(&id) {
                    trace!("Mix not loaded: {}", e);
                }
            }
        }
        ReplCommand::Delete(query) => {
            if let Some(id) = resolve_mix(session, &query) {
                session.delete_mix(&id);
            }
        }
        ReplCommand::Share(query) => {
            if let Some(url) =
                resolve_mix(session, &query).and_then(|id| session.share_mix(&id))
            {
                Display::show_message(&url);
            }
        }
        ReplCommand::Mixes => Display::show_mixes(session.mixes()),
        ReplCommand::Status => Display::show_status(session.playback(), session.timer()),
        ReplCommand::Help => Display::show_message(HELP),
        ReplCommand::Quit => return Flow::Quit,
    }
    Flow::Continue
}
