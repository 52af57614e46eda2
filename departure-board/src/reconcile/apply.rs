//! Applying a selection to the board.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::display::{DepartureBoard, DepartureRow, RowChange};
use crate::domain::{Trip, TripId};
use crate::settings::RefreshSettings;

use super::select::{Selected, countdown_label, select_departures};

/// Counts of what one reconciliation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Fetched trips that were filtered out, deduplicated or over the limit.
    pub dropped: usize,
}

impl ReconcileSummary {
    /// Rows on the board afterwards.
    pub fn shown(&self) -> usize {
        self.created + self.updated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No station configured; the board shows the notice instead.
    NotConfigured,
    Applied(ReconcileSummary),
}

/// Maps fetched trips onto the board's keyed rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    /// Reconcile `board` against `trips`.
    ///
    /// Rows for kept trips are upserted first (in feed order), stale rows are
    /// removed only once the new set is known, then the board is reordered
    /// and stamped with `now`. Must be called with exclusive access to the
    /// board; callers get that by running it on the board actor.
    pub fn apply<B: DepartureBoard + ?Sized>(
        board: &mut B,
        trips: &[Trip],
        settings: &RefreshSettings,
        now: DateTime<Utc>,
    ) -> ReconcileOutcome {
        if settings.station_id().is_none() {
            board.show_not_configured();
            return ReconcileOutcome::NotConfigured;
        }

        let selection = select_departures(trips, settings, now);
        let mut summary = ReconcileSummary {
            dropped: selection.dropped(),
            ..ReconcileSummary::default()
        };

        let mut by_input: Vec<&Selected<'_>> = selection.kept.iter().collect();
        by_input.sort_by_key(|s| s.input_index);
        for selected in by_input {
            match board.upsert_row(row_for(selected)) {
                RowChange::Created => summary.created += 1,
                RowChange::Updated => summary.updated += 1,
            }
        }

        let kept: HashSet<&TripId> = selection.kept_ids().collect();
        let mut stale: Vec<TripId> = board
            .current_row_ids()
            .into_iter()
            .filter(|id| !kept.contains(id))
            .collect();
        stale.sort_unstable();
        for id in &stale {
            if board.remove_row(id) {
                summary.removed += 1;
            }
        }

        let order: Vec<TripId> = selection.kept_ids().cloned().collect();
        board.reorder(&order);
        board.set_last_refreshed(now);

        debug!(
            created = summary.created,
            updated = summary.updated,
            removed = summary.removed,
            dropped = summary.dropped,
            "reconciled board"
        );
        ReconcileOutcome::Applied(summary)
    }
}

fn row_for(selected: &Selected<'_>) -> DepartureRow {
    let trip = selected.trip;
    DepartureRow {
        trip_id: trip.trip_id.clone(),
        line: trip.line_name.clone(),
        direction: trip.direction.clone(),
        countdown: countdown_label(selected.lead_time),
        product: trip.product,
        cancelled: trip.is_cancelled(),
    }
}
