//! Mock feed client for running without network access.
//!
//! Loads sample departure boards from JSON files and serves them as if they
//! were live API responses.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use crate::domain::{Clock, Product, Trip};

use super::client::parse_departures;
use super::error::FeedError;
use super::source::TripSource;

/// Mock feed that serves departures from JSON files.
///
/// Fixtures use the same format as the live API. By default they are served
/// verbatim; with [`MockFeedClient::with_clock`] every board is shifted so
/// that its earliest departure is always a couple of minutes away, which
/// keeps a long-running demo board populated.
#[derive(Clone)]
pub struct MockFeedClient {
    /// Pre-loaded boards, keyed by station id.
    boards: HashMap<String, Vec<Trip>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
}

impl MockFeedClient {
    /// Create a new mock client by loading JSON files from a directory.
    ///
    /// Expects files named `{stationId}.json` (e.g., `900100003.json`).
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, FeedError> {
        let data_dir = data_dir.as_ref();
        let mut boards = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            FeedError::MockData(format!("failed to read {}: {e}", data_dir.display()))
        })?;

        for entry in entries {
            let entry = entry
                .map_err(|e| FeedError::MockData(format!("failed to read directory entry: {e}")))?;

            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let station_id = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| FeedError::MockData(format!("invalid filename: {path:?}")))?
                .to_string();

            let bytes = std::fs::read(&path)
                .map_err(|e| FeedError::MockData(format!("failed to read {path:?}: {e}")))?;
            let trips = parse_departures(&bytes)?;

            debug!(%station_id, count = trips.len(), "loaded mock board");
            boards.insert(station_id, trips);
        }

        if boards.is_empty() {
            return Err(FeedError::MockData(format!(
                "no mock board files found in {}",
                data_dir.display()
            )));
        }

        Ok(Self {
            boards,
            clock: None,
        })
    }

    /// Shift served times relative to `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// List available stations in the mock data.
    pub fn available_stations(&self) -> Vec<&str> {
        let mut stations: Vec<&str> = self.boards.keys().map(String::as_str).collect();
        stations.sort_unstable();
        stations
    }

    fn rebase(&self, trips: &mut [Trip]) {
        let Some(clock) = &self.clock else {
            return;
        };
        let Some(earliest) = trips.iter().map(|t| t.planned_time).min() else {
            return;
        };

        let offset = clock.now() + Duration::minutes(2) - earliest;
        for trip in trips {
            trip.planned_time += offset;
            if let Some(t) = trip.departure_time.as_mut() {
                *t += offset;
            }
        }
    }
}

impl TripSource for MockFeedClient {
    fn fetch_trips(
        &mut self,
        station_id: &str,
        enabled_products: &BTreeSet<Product>,
        max_results: u32,
    ) -> Vec<Trip> {
        let Some(board) = self.boards.get(station_id) else {
            warn!(
                station_id,
                available = ?self.available_stations(),
                "no mock data for station"
            );
            return Vec::new();
        };

        let limit = usize::try_from(max_results.max(1)).unwrap_or(usize::MAX);
        let mut trips: Vec<Trip> = board
            .iter()
            // The live API leaves out products that were not requested
            .filter(|t| t.product.is_none_or(|p| enabled_products.contains(&p)))
            .take(limit)
            .cloned()
            .collect();

        self.rebase(&mut trips);
        trips
    }
}
