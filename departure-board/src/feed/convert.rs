//! Conversion from feed DTOs to domain types.

use tracing::debug;

use crate::domain::{Product, TimeError, Trip, TripId, parse_wire_time};

use super::types::{DepartureDto, DeparturesResponse};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConversionError {
    /// A timestamp field held something other than an ISO-8601 date-time
    #[error("trip {trip_id}: bad {field}: {source}")]
    InvalidTime {
        trip_id: String,
        field: &'static str,
        #[source]
        source: TimeError,
    },

    /// Empty trip id; it could never be reconciled
    #[error("departure without trip id")]
    MissingTripId,
}

/// Convert a departures response to trips, preserving feed order.
///
/// Any unusable departure fails the whole response: a half-converted board
/// would make the reconciler remove rows that are in fact still running.
pub fn convert_departures(resp: &DeparturesResponse) -> Result<Vec<Trip>, ConversionError> {
    resp.departures.iter().map(convert_departure).collect()
}

/// Convert a single departure.
pub fn convert_departure(dep: &DepartureDto) -> Result<Trip, ConversionError> {
    if dep.trip_id.is_empty() {
        return Err(ConversionError::MissingTripId);
    }

    let time = |field: &'static str, value: &str| {
        parse_wire_time(value).map_err(|source| ConversionError::InvalidTime {
            trip_id: dep.trip_id.clone(),
            field,
            source,
        })
    };

    let departure_time = dep.when.as_deref().map(|w| time("when", w)).transpose()?;
    let planned_time = time("plannedWhen", &dep.planned_when)?;

    let product = match Product::parse(&dep.line.product) {
        Ok(p) => Some(p),
        Err(e) => {
            debug!(trip_id = %dep.trip_id, error = %e, "keeping departure with unknown product");
            None
        }
    };

    Ok(Trip {
        trip_id: TripId::new(dep.trip_id.clone()),
        departure_time,
        planned_time,
        direction: dep.direction.clone(),
        line_name: dep.line.name.clone(),
        product,
    })
}
