//! Display contract.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{Product, TripId};

/// Everything a board needs to draw one departure row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureRow {
    pub trip_id: TripId,
    pub line: String,
    pub direction: String,
    /// Pre-formatted countdown, e.g. "Now" or "7'".
    pub countdown: String,
    pub product: Option<Product>,
    pub cancelled: bool,
}

/// What [`DepartureBoard::upsert_row`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    Created,
    Updated,
}

/// A display showing a keyed list of departure rows.
///
/// Rows are identified by trip id. The board owns the visual resources
/// behind each row; the reconciler decides when rows come and go.
pub trait DepartureBoard {
    /// Create the row for `row.trip_id`, or update it in place if it exists.
    fn upsert_row(&mut self, row: DepartureRow) -> RowChange;

    /// Destroy a row. Returns whether it existed.
    fn remove_row(&mut self, trip_id: &TripId) -> bool;

    /// Arrange rows top to bottom in the given order.
    fn reorder(&mut self, order: &[TripId]);

    /// Record when the rows were last refreshed.
    fn set_last_refreshed(&mut self, at: DateTime<Utc>);

    /// Replace the rows with a "no station configured" notice.
    fn show_not_configured(&mut self);

    /// Ids of all rows currently on the board.
    fn current_row_ids(&self) -> HashSet<TripId>;

    /// Re-render time-dependent text (e.g. "last updated 5s ago").
    fn refresh_elapsed(&mut self, _now: DateTime<Utc>) {}

    /// Push pending changes to the screen.
    fn present(&mut self) {}
}
