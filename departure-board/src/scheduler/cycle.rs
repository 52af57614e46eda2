//! One fetch-and-reconcile pass.

use tracing::{debug, error, info};

use crate::display::BoardHandle;
use crate::domain::Clock;
use crate::feed::TripSource;
use crate::settings::SettingsStore;

/// How a single refresh cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No station configured, or the settings could not be read.
    NotConfigured,
    /// Nothing was fetched; the board was left as it was.
    Skipped,
    /// Fetched trips were handed to the board for reconciliation.
    Reconciled { fetched: usize },
    /// The board actor has gone away.
    BoardClosed,
}

/// Everything one refresh needs, owned by the worker thread.
pub struct RefreshCycle<F, S, C> {
    feed: F,
    settings: S,
    clock: C,
    board: BoardHandle,
}

impl<F, S, C> RefreshCycle<F, S, C>
where
    F: TripSource,
    S: SettingsStore,
    C: Clock,
{
    pub fn new(feed: F, settings: S, clock: C, board: BoardHandle) -> Self {
        Self {
            feed,
            settings,
            clock,
            board,
        }
    }

    /// Read settings, fetch, and submit the result to the board.
    ///
    /// Settings are read fresh every time. A fetch that comes back empty
    /// leaves the board untouched.
    pub fn run_once(&mut self) -> CycleOutcome {
        let settings = match self.settings.read() {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "failed to read settings");
                return self.not_configured();
            }
        };

        let Some(station) = settings.station() else {
            debug!("no station configured");
            return self.not_configured();
        };

        let trips = self.feed.fetch_trips(
            &station.id,
            &station.enabled_products,
            settings.max_departure_count,
        );
        if trips.is_empty() {
            info!(station_id = %station.id, "no departures fetched, keeping current board");
            return CycleOutcome::Skipped;
        }

        let fetched = trips.len();
        debug!(station_id = %station.id, fetched, "fetched departures");

        let now = self.clock.now();
        match self.board.reconcile(trips, settings, now) {
            Ok(()) => CycleOutcome::Reconciled { fetched },
            Err(_) => CycleOutcome::BoardClosed,
        }
    }

    fn not_configured(&self) -> CycleOutcome {
        match self.board.show_not_configured() {
            Ok(()) => CycleOutcome::NotConfigured,
            Err(_) => CycleOutcome::BoardClosed,
        }
    }
}
