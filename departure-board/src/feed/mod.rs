//! Departures feed client.
//!
//! This module provides an HTTP client for the public transit REST API
//! (`transport.rest`), which serves real-time departures per stop.
//!
//! Key characteristics of the feed:
//! - Trip IDs are stable for the lifetime of a vehicle run, so they can key
//!   rows across refreshes
//! - Times are ISO-8601 date-times with an offset
//! - A cancelled departure keeps its `plannedWhen` but has `when: null`
//! - Products (subway, bus, ...) are switched on and off per request

mod buffer;
mod client;
mod convert;
mod error;
mod mock;
mod source;
mod types;

pub use buffer::{BufferOverflow, ResponseBuffer};
pub use client::{DEFAULT_BUFFER_CAPACITY, FeedClient, FeedConfig, parse_departures};
pub use convert::{ConversionError, convert_departure, convert_departures};
pub use error::FeedError;
pub use mock::MockFeedClient;
pub use source::TripSource;
pub use types::{DepartureDto, DeparturesResponse, LineDto};
