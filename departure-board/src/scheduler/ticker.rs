//! A fixed-period timer thread.

use std::ops::ControlFlow;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

/// Calls a closure every `period` on its own thread.
///
/// The first call happens one period after spawning. The thread stops when
/// the closure breaks, or when the ticker is stopped or dropped.
pub struct Ticker {
    name: String,
    stop: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<T>(name: &str, period: Duration, mut on_tick: T) -> std::io::Result<Self>
    where
        T: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let (stop, stop_rx) = mpsc::channel::<()>();
        let join = thread::Builder::new().name(name.to_string()).spawn(move || {
            // Sleeping on the stop channel makes stop() take effect immediately
            while let Err(RecvTimeoutError::Timeout) = stop_rx.recv_timeout(period) {
                if on_tick().is_break() {
                    break;
                }
            }
        })?;

        debug!(ticker = name, ?period, "ticker started");
        Ok(Self {
            name: name.to_string(),
            stop: Some(stop),
            join: Some(join),
        })
    }

    /// Stop ticking and wait for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel
        self.stop.take();
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!(ticker = %self.name, "ticker thread panicked");
            }
            debug!(ticker = %self.name, "ticker stopped");
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
