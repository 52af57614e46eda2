//! Live departure board.
//!
//! Periodically fetches upcoming departures for a configured stop from a
//! public transit REST feed and keeps an on-screen list of departures in
//! step with it: rows are keyed by trip, updated in place, removed when the
//! trip drops out of the feed, and kept ordered by departure time.

pub mod config;
pub mod display;
pub mod domain;
pub mod feed;
pub mod reconcile;
pub mod scheduler;
pub mod settings;
