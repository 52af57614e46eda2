//! Periodic refresh scheduling.
//!
//! A [`Ticker`] posts triggers into a queue that holds at most one pending
//! trigger; a single worker thread drains it and runs one job per trigger.
//! Triggers that arrive while one is already pending are dropped, so a slow
//! fetch never builds up a backlog and never overlaps with another.

mod cycle;
mod ticker;

use std::ops::ControlFlow;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::Clock;
use crate::feed::TripSource;
use crate::settings::SettingsStore;

pub use cycle::{CycleOutcome, RefreshCycle};
pub use ticker::Ticker;

/// Default time between refreshes.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(10);

/// Result of posting a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Queued,
    /// A trigger was already pending.
    Dropped,
    /// The worker has exited.
    Stopped,
}

/// Ticker plus worker.
pub struct Scheduler {
    trigger: SyncSender<()>,
    ticker: Ticker,
    worker: JoinHandle<()>,
}

impl Scheduler {
    /// Start the worker and the ticker.
    ///
    /// `job` runs on the worker thread once per accepted trigger. Returning
    /// `ControlFlow::Break` stops the worker.
    pub fn start<J>(period: Duration, mut job: J) -> std::io::Result<Self>
    where
        J: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (trigger, queue) = mpsc::sync_channel::<()>(1);

        let worker = thread::Builder::new()
            .name("refresh-worker".to_string())
            .spawn(move || {
                for () in queue {
                    if job().is_break() {
                        info!("refresh worker stopping");
                        break;
                    }
                }
                debug!("refresh worker exited");
            })?;

        let tick_trigger = trigger.clone();
        let ticker = Ticker::spawn("refresh-ticker", period, move || {
            match post(&tick_trigger) {
                Trigger::Stopped => ControlFlow::Break(()),
                Trigger::Queued | Trigger::Dropped => ControlFlow::Continue(()),
            }
        })?;

        Ok(Self {
            trigger,
            ticker,
            worker,
        })
    }

    /// Start a [`RefreshCycle`] every `period`.
    pub fn for_cycle<F, S, C>(
        period: Duration,
        mut cycle: RefreshCycle<F, S, C>,
    ) -> std::io::Result<Self>
    where
        F: TripSource + Send + 'static,
        S: SettingsStore + Send + 'static,
        C: Clock + Send + 'static,
    {
        Self::start(period, move || match cycle.run_once() {
            CycleOutcome::BoardClosed => ControlFlow::Break(()),
            outcome => {
                debug!(?outcome, "refresh cycle finished");
                ControlFlow::Continue(())
            }
        })
    }

    /// Ask for a refresh without waiting for the next tick.
    pub fn trigger_now(&self) -> Trigger {
        post(&self.trigger)
    }

    /// Wait for the worker to exit on its own.
    pub fn join(self) {
        let Self {
            trigger,
            ticker,
            worker,
        } = self;
        drop(trigger);
        if worker.join().is_err() {
            warn!("refresh worker panicked");
        }
        ticker.stop();
    }

    /// Stop ticking, let any pending trigger run, and wait for the worker.
    pub fn stop(self) {
        let Self {
            trigger,
            ticker,
            worker,
        } = self;
        ticker.stop();
        drop(trigger);
        if worker.join().is_err() {
            warn!("refresh worker panicked");
        }
    }
}

fn post(trigger: &SyncSender<()>) -> Trigger {
    match trigger.try_send(()) {
        Ok(()) => Trigger::Queued,
        Err(TrySendError::Full(())) => {
            debug!("refresh already pending, dropping trigger");
            Trigger::Dropped
        }
        Err(TrySendError::Disconnected(())) => Trigger::Stopped,
    }
}
