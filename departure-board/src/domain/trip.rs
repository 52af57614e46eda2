//! Trip (single departure) types.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

use super::Product;

/// Identifier of one vehicle run, as assigned by the feed.
///
/// Opaque to us; the only guarantee is that the same physical departure
/// keeps the same id across refreshes, which makes it the reconciliation
/// key for board rows.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripId(String);

impl TripId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TripId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TripId({})", self.0)
    }
}

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One departure parsed from the feed.
///
/// `departure_time` is the real-time estimate; the feed sends `null` for it
/// when the departure is cancelled, so its absence is the cancellation
/// marker. `planned_time` is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub trip_id: TripId,
    pub departure_time: Option<DateTime<Utc>>,
    pub planned_time: DateTime<Utc>,
    pub direction: String,
    pub line_name: String,
    /// `None` when the feed names a product we don't know.
    pub product: Option<Product>,
}

impl Trip {
    /// Whether this departure has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.departure_time.is_none()
    }

    /// The instant shown on the board and used for ordering and filtering.
    ///
    /// Cancelled trips fall back to their planned time.
    pub fn display_time(&self) -> DateTime<Utc> {
        self.departure_time.unwrap_or(self.planned_time)
    }

    /// Time remaining until [`Trip::display_time`], negative once it has passed.
    pub fn lead_time(&self, now: DateTime<Utc>) -> Duration {
        self.display_time().signed_duration_since(now)
    }
}
