//! Interactive session wiring.
//!
//! Builds the real collaborators from the configuration, restores the
//! stored state and drives the session from one task: tick messages,
//! stdin lines, notices and Ctrl-C are all received in a single
//! `tokio::select!` loop.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Sleep;
use tracing::{debug, info, warn};

use super::commands::PlayArgs;
use super::display::Display;
use super::repl::{self, Flow, HELP};
use crate::catalog::{self, Catalog};
use crate::config::AppConfig;
use crate::notification::DesktopNotifier;
use crate::session::{Services, Session, SessionChannels, SessionOptions};
use crate::share;
use crate::sound::{missing_sources, AudioTransport, ChimePlayer, RodioAudio, SilentAudio};
use crate::storage::{FileMixStore, FilePreferenceStore};
use crate::types::PlaybackMode;

// ============================================================================
// Setup
// ============================================================================

/// Loads the configured catalog, or the built-in one.
///
/// # Errors
///
/// Returns an error if a configured catalog file cannot be loaded.
pub fn build_catalog(config: &AppConfig) -> Result<Arc<Catalog>> {
    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => catalog::builtin(),
    };
    Ok(Arc::new(catalog))
}

/// Opens the audio device, falling back to silence when there is none.
fn build_audio(
    catalog: &Catalog,
    config: &AppConfig,
) -> Result<(Arc<dyn AudioTransport>, Arc<dyn ChimePlayer>)> {
    let sounds_dir = config.sounds_dir()?;

    let missing = missing_sources(catalog, &sounds_dir);
    if !missing.is_empty() {
        warn!(
            "{} of {} tracks have no audio file under {}",
            missing.len(),
            catalog.tracks().len(),
            sounds_dir.display()
        );
    }

    match RodioAudio::new(catalog, sounds_dir) {
        Ok(audio) => {
            let audio = Arc::new(audio);
            Ok((audio.clone(), audio))
        }
        Err(e) => {
            warn!("Audio disabled: {} ({})", e, e.suggestion());
            let silent = Arc::new(SilentAudio);
            Ok((silent.clone(), silent))
        }
    }
}

/// Builds the production collaborators of a session.
///
/// # Errors
///
/// Returns an error if the catalog or the data directory cannot be
/// resolved.
pub fn build_services(config: &AppConfig) -> Result<Services> {
    let catalog = build_catalog(config)?;
    let data_dir = config.data_dir()?;
    let (transport, chime) = build_audio(&catalog, config)?;
    debug!("Data directory: {}", data_dir.display());

    Ok(Services {
        catalog,
        transport,
        chime,
        notifier: Arc::new(DesktopNotifier::new()),
        preferences: Arc::new(FilePreferenceStore::in_dir(&data_dir)),
        mixes: Arc::new(FileMixStore::in_dir(&data_dir)),
    })
}

// ============================================================================
// Startup arguments
// ============================================================================

/// Makes exactly `tracks` the active set and starts playback.
fn play_tracks(session: &mut Session, tracks: &[String], mix: bool) {
    let known: Vec<&String> = tracks
        .iter()
        .filter(|id| {
            let found = session.catalog().contains(id);
            if !found {
                Display::show_error(&format!("unknown track '{}'", id));
            }
            found
        })
        .collect();
    let Some(first) = known.first() else {
        return;
    };

    if mix || known.len() > 1 {
        session.set_mode(PlaybackMode::Mix);
        let stale: Vec<String> = session
            .playback()
            .active_ids()
            .into_iter()
            .filter(|id| !known.contains(&id))
            .collect();
        // Activating an active mix track removes it
        for id in stale {
            session.activate_track(&id);
        }
        for id in &known {
            if !session.playback().is_active(id) {
                session.activate_track(id);
            }
        }
        session.autoplay();
    } else {
        session.set_mode(PlaybackMode::Single);
        session.activate_track(first);
    }
}

/// Applies the `play` arguments and returns the pending autoplay delay.
fn apply_args(session: &mut Session, args: &PlayArgs) -> Result<Option<Pin<Box<Sleep>>>> {
    if let Some(volume) = args.volume {
        session.set_master_volume(volume);
    }

    let mut autoplay = None;
    if let Some(url) = &args.url {
        let url = if share::token_from_url(url).is_some() {
            url.clone()
        } else {
            share::share_url(&session.options().share_base_url, url.trim())
                .context("invalid share_base_url in config")?
        };
        let outcome = session.bootstrap(&url);
        autoplay = outcome
            .autoplay_after
            .map(|delay| Box::pin(tokio::time::sleep(delay)));
    } else if let Some(query) = &args.load {
        let id = session
            .library()
            .find(query)
            .map(|mix| mix.id.clone())
            .with_context(|| format!("no saved mix matches '{}'", query))?;
        session.load_mix(&id)?;
        session.autoplay();
    } else if !args.tracks.is_empty() {
        play_tracks(session, &args.tracks, args.mix);
    } else if args.mix {
        session.set_mode(PlaybackMode::Mix);
    }

    if let Some(focus) = args.focus {
        session
            .start_timer(
                focus * 60,
                args.task.as_deref().unwrap_or_default(),
                args.break_minutes * 60,
                args.rounds,
            )
            .context("failed to start timer")?;
    }
    Ok(autoplay)
}

// ============================================================================
// Event loop
// ============================================================================

async fn wait_for(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.await,
        None => pending().await,
    }
}

fn drain_notices(channels: &mut SessionChannels) {
    while let Ok(notice) = channels.notices.try_recv() {
        Display::show_notice(&notice);
    }
}

/// Runs an interactive session until `quit`, Ctrl-C, or end of input with
/// no timer left running.
///
/// # Errors
///
/// Returns an error if the session cannot be set up or the startup
/// arguments cannot be applied.
pub async fn run_interactive(config: &AppConfig, args: PlayArgs) -> Result<()> {
    let services = build_services(config)?;
    let (mut session, mut channels) = Session::new(services, SessionOptions::from(config));
    session.restore();

    let mut autoplay = apply_args(&mut session, &args)?;
    drain_notices(&mut channels);
    Display::show_status(session.playback(), session.timer());
    Display::show_message("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted");
                break;
            }
            Some(generation) = channels.ticks.recv() => {
                if let Some(completion) = session.handle_tick(generation) {
                    Display::show_completion(&completion);
                }
            }
            Some(event) = channels.timer_events.recv() => {
                Display::show_timer_event(&event, session.timer());
            }
            Some(notice) = channels.notices.recv() => {
                Display::show_notice(&notice);
            }
            _ = wait_for(&mut autoplay) => {
                autoplay = None;
                session.autoplay();
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match repl::parse(&line) {
                    Ok(Some(command)) => {
                        if repl::apply(&mut session, command) == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => Display::show_error(&format!("{}\n{}", e, HELP)),
                },
                Ok(None) => {
                    debug!("End of input");
                    stdin_open = false;
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    stdin_open = false;
                }
            },
        }

        if !stdin_open && !session.timer().is_active && autoplay.is_none() {
            break;
        }
    }

    drain_notices(&mut channels);
    session.shutdown();
    info!("Interactive session ended");
    Ok(())
}
