//! Choosing which trips the board shows, and in what order.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{Trip, TripId};
use crate::settings::RefreshSettings;

/// Countdown text for a departure `lead` from now.
///
/// Whole minutes, truncated towards zero; anything under a minute (or
/// already past) reads "Now".
///
/// ```
/// use chrono::Duration;
/// use departure_board::reconcile::countdown_label;
///
/// assert_eq!(countdown_label(Duration::seconds(59)), "Now");
/// assert_eq!(countdown_label(Duration::seconds(-30)), "Now");
/// assert_eq!(countdown_label(Duration::minutes(7)), "7'");
/// assert_eq!(countdown_label(Duration::seconds(7 * 60 + 59)), "7'");
/// ```
pub fn countdown_label(lead: Duration) -> String {
    let minutes = lead.num_minutes();
    if minutes <= 0 {
        "Now".to_string()
    } else {
        format!("{minutes}'")
    }
}

/// A trip that made it onto the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected<'a> {
    pub trip: &'a Trip,
    /// Position in the fetched list.
    pub input_index: usize,
    pub lead_time: Duration,
}

/// Result of [`select_departures`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection<'a> {
    /// Kept trips in display order.
    pub kept: Vec<Selected<'a>>,
    /// Dropped by the lead-time filter.
    pub too_soon: usize,
    /// Dropped because cancelled departures are hidden.
    pub cancelled: usize,
    /// Later repeats of a trip id already kept.
    pub duplicates: usize,
    /// Dropped past `max_departure_count`.
    pub over_limit: usize,
}

impl Selection<'_> {
    /// Total number of trips that were not kept.
    pub fn dropped(&self) -> usize {
        self.too_soon + self.cancelled + self.duplicates + self.over_limit
    }

    pub fn kept_ids(&self) -> impl Iterator<Item = &TripId> {
        self.kept.iter().map(|s| &s.trip.trip_id)
    }
}

/// Pick the trips to display.
///
/// A trip is dropped when it leaves sooner than the configured lead time
/// (a trip exactly at the threshold stays), or when it is cancelled and
/// cancelled departures are hidden. The first occurrence of a trip id wins.
/// The rest are ordered by display time, ties keeping feed order, and
/// capped at `max_departure_count`.
pub fn select_departures<'a>(
    trips: &'a [Trip],
    settings: &RefreshSettings,
    now: DateTime<Utc>,
) -> Selection<'a> {
    let min_lead = settings.min_lead_time();
    let mut selection = Selection::default();
    let mut seen: HashSet<&TripId> = HashSet::with_capacity(trips.len());

    for (input_index, trip) in trips.iter().enumerate() {
        let lead_time = trip.lead_time(now);

        if let Some(min) = min_lead
            && lead_time < min
        {
            selection.too_soon += 1;
            continue;
        }
        if trip.is_cancelled() && !settings.show_cancelled_departures {
            selection.cancelled += 1;
            continue;
        }
        if !seen.insert(&trip.trip_id) {
            selection.duplicates += 1;
            continue;
        }

        selection.kept.push(Selected {
            trip,
            input_index,
            lead_time,
        });
    }

    // Stable, so equal times keep feed order
    selection.kept.sort_by_key(|s| s.trip.display_time());

    let limit = usize::try_from(settings.max_departure_count.max(1)).unwrap_or(usize::MAX);
    if selection.kept.len() > limit {
        selection.over_limit = selection.kept.len() - limit;
        selection.kept.truncate(limit);
    }

    selection
}
