//! Focus/break timer engine.
//!
//! This module provides the timer half of the state model:
//! - Phase machine (Focus → Break → Focus … → finished)
//! - One-second tick function
//! - Pause, reset and add-time commands
//! - Event firing for the display and notifications
//!
//! The engine does not own a clock. The session drives `tick()` from the
//! messages of a [`TickLoop`].

mod error;
mod ticker;

use tokio::sync::mpsc;
use tracing::{debug, trace};

pub use error::TimerError;
pub use ticker::{TickLoop, TICK_INTERVAL};

use crate::types::{TimerPhase, TimerPreferences, TimerState};

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for the display and external integrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A new run started in the focus phase
    Started {
        task: String,
        total_rounds: u32,
    },
    /// One second elapsed
    Tick {
        /// Remaining seconds
        remaining: u32,
    },
    /// A phase ran out
    PhaseCompleted {
        phase: TimerPhase,
        /// 0-based round the phase belonged to
        round: u32,
    },
    /// The next phase began after a completion
    PhaseStarted {
        phase: TimerPhase,
        round: u32,
    },
    /// The last phase of the run completed
    Finished {
        completed_rounds: u32,
    },
    Paused,
    Resumed,
    /// The timer was jumped to a phase or restarted
    Reset {
        phase: TimerPhase,
    },
    TimeAdded {
        minutes: u32,
        remaining: u32,
    },
    Cancelled,
}

/// Outcome of a tick that ended a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCompletion {
    /// The phase that ran out
    pub ended: TimerPhase,
    /// The phase that follows, or `None` when the run is over
    pub next: Option<TimerPhase>,
    pub task: String,
}

impl PhaseCompletion {
    /// Returns true if the run is over.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.next.is_none()
    }
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that manages the timer state and events.
#[derive(Debug)]
pub struct TimerEngine {
    state: TimerState,
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an inactive engine carrying the given preferences.
    pub fn new(preferences: TimerPreferences, event_tx: mpsc::UnboundedSender<TimerEvent>) -> Self {
        Self {
            state: TimerState::new(preferences),
            event_tx,
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            trace!("Timer event dropped, no receiver");
        }
    }

    /// Starts a new run, replacing any current one.
    ///
    /// `break_seconds` of zero makes a simple timer.
    ///
    /// # Errors
    ///
    /// Returns an error if `focus_seconds` is zero or `rounds` is outside
    /// 1..=10. The current run is left untouched in that case.
    pub fn start(
        &mut self,
        focus_seconds: u32,
        task: impl Into<String>,
        break_seconds: u32,
        rounds: u32,
    ) -> Result<(), TimerError> {
        if focus_seconds == 0 {
            return Err(TimerError::InvalidDuration);
        }
        if !(1..=TimerState::MAX_ROUNDS).contains(&rounds) {
            return Err(TimerError::InvalidRounds(rounds));
        }

        let task = task.into();
        self.state.begin(focus_seconds, task.clone(), break_seconds, rounds);
        debug!(
            "Timer started: focus={}s break={}s rounds={}",
            focus_seconds, break_seconds, rounds
        );

        self.emit(TimerEvent::Started {
            task,
            total_rounds: rounds,
        });
        Ok(())
    }

    /// Advances the timer by one second.
    ///
    /// Does nothing while inactive or paused. Returns the completion when
    /// this tick ended a phase; the state has already moved on by then.
    pub fn tick(&mut self) -> Option<PhaseCompletion> {
        if !self.state.is_running() {
            return None;
        }

        if !self.state.tick() {
            self.emit(TimerEvent::Tick {
                remaining: self.state.remaining,
            });
            return None;
        }

        Some(self.complete_phase())
    }

    /// Handles a phase running out (phase transitions).
    fn complete_phase(&mut self) -> PhaseCompletion {
        let ended = self.state.phase;
        let round = self.state.current_round;
        self.emit(TimerEvent::PhaseCompleted {
            phase: ended,
            round,
        });

        let next = match ended {
            TimerPhase::Focus if !self.state.is_simple() => Some(TimerPhase::Break),
            TimerPhase::Focus => None,
            TimerPhase::Break => {
                self.state.completed_rounds += 1;
                self.state.current_round += 1;
                if self.state.current_round >= self.state.total_rounds {
                    None
                } else {
                    Some(TimerPhase::Focus)
                }
            }
        };

        match next {
            Some(phase) => {
                self.state.enter_phase(phase);
                debug!("Timer phase {} -> {}", ended.as_str(), phase.as_str());
                self.emit(TimerEvent::PhaseStarted {
                    phase,
                    round: self.state.current_round,
                });
            }
            None => {
                self.state.finish();
                debug!("Timer finished after {} rounds", self.state.completed_rounds);
                self.emit(TimerEvent::Finished {
                    completed_rounds: self.state.completed_rounds,
                });
            }
        }

        PhaseCompletion {
            ended,
            next,
            task: self.state.task.clone(),
        }
    }

    /// Flips between paused and counting.
    ///
    /// Returns the new paused flag. Does nothing while inactive.
    pub fn toggle_pause(&mut self) -> bool {
        if !self.state.is_active {
            return false;
        }

        self.state.is_paused = !self.state.is_paused;
        self.emit(if self.state.is_paused {
            TimerEvent::Paused
        } else {
            TimerEvent::Resumed
        });
        self.state.is_paused
    }

    /// Jumps to `phase` with its full duration, or restarts the run from
    /// round 0 when no phase is given.
    ///
    /// Jumping to Break on a simple timer leaves zero seconds; the next
    /// tick completes it as a break.
    ///
    /// Returns false when there was nothing to restart.
    pub fn reset(&mut self, phase: Option<TimerPhase>) -> bool {
        let phase = match phase {
            Some(phase) => {
                self.state.enter_phase(phase);
                phase
            }
            None if self.state.focus_duration > 0 => {
                self.state.restart();
                TimerPhase::Focus
            }
            None => return false,
        };

        debug!("Timer reset to {} ({}s)", phase.as_str(), self.state.remaining);
        self.emit(TimerEvent::Reset { phase });
        true
    }

    /// Adds whole minutes to the current phase. There is no upper bound.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NotActive` if no timer is running.
    pub fn add_minutes(&mut self, minutes: u32) -> Result<(), TimerError> {
        if !self.state.is_active {
            return Err(TimerError::NotActive);
        }

        self.state.remaining = self.state.remaining.saturating_add(minutes.saturating_mul(60));
        self.emit(TimerEvent::TimeAdded {
            minutes,
            remaining: self.state.remaining,
        });
        Ok(())
    }

    /// Stops and zeroes the timer, keeping the preferences.
    pub fn cancel(&mut self) {
        let was_active = self.state.is_active;
        self.state.clear();
        if was_active {
            debug!("Timer cancelled");
            self.emit(TimerEvent::Cancelled);
        }
    }

    /// Replaces the timer preferences.
    pub fn set_preferences(&mut self, preferences: TimerPreferences) {
        self.state.preferences = preferences;
    }

    pub fn preferences(&self) -> &TimerPreferences {
        &self.state.preferences
    }

    /// Returns a reference to the current timer state.
    pub fn state(&self) -> &TimerState {
        &self.state
    }
}

// ============================================================================
// Tests
// ============================================================================
