//! Turning a fetched list of trips into board mutations.
//!
//! Selection (filter, dedupe, order, cap) is pure and lives in [`select`];
//! [`Reconciler::apply`] applies a selection to a
//! [`DepartureBoard`](crate::display::DepartureBoard) with the fewest row
//! creations and removals.

mod apply;
mod select;

pub use apply::{ReconcileOutcome, ReconcileSummary, Reconciler};
pub use select::{Selected, Selection, countdown_label, select_departures};
