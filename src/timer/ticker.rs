//! The one-second tick loop driving the timer.
//!
//! The loop never touches timer state. Each second it sends its generation
//! number; whoever owns the session receives it and passes it to
//! `Session::handle_tick`, which drops ticks from replaced loops.

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Period of the tick loop.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to a running tick loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct TickLoop {
    handle: JoinHandle<()>,
}

impl TickLoop {
    /// Spawns a tick loop on the current tokio runtime. Every tick carries
    /// `generation`.
    ///
    /// The first tick arrives one period after spawning. Returns `None`
    /// when called outside a runtime; ticks then have to be driven by hand.
    pub fn spawn(tick_tx: mpsc::UnboundedSender<u64>, generation: u64) -> Option<Self> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!("No tokio runtime, timer ticks must be driven manually");
                return None;
            }
        };

        let handle = runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK_INTERVAL, TICK_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if tick_tx.send(generation).is_err() {
                    debug!("Tick receiver closed, stopping tick loop");
                    break;
                }
            }
        });

        debug!("Tick loop {} started", generation);
        Some(Self { handle })
    }

    /// Returns true once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TickLoop {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
