//! Departures feed response DTOs.
//!
//! Only the handful of fields the board needs are declared; serde skips
//! everything else in the (fairly verbose) response while deserializing, so
//! neither memory use nor the shape of these types depends on what else the
//! feed decides to send.

use serde::{Deserialize, Deserializer};

/// Response from `GET /stops/{id}/departures`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeparturesResponse {
    pub departures: Vec<DepartureDto>,
}

/// One departure on the board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureDto {
    /// Identifier of the vehicle run, stable across requests.
    pub trip_id: String,

    /// Headsign shown on the vehicle.
    pub direction: String,

    pub line: LineDto,

    /// Real-time departure. Always sent, `null` when cancelled.
    #[serde(deserialize_with = "nullable")]
    pub when: Option<String>,

    /// Scheduled departure.
    pub planned_when: String,
}

/// The line a departure belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct LineDto {
    /// Public line name, e.g. "U8" or "M10".
    pub name: String,

    /// Product name, e.g. "subway".
    pub product: String,
}

// Unlike a plain `Option`, a field using this must be present in the JSON;
// only its value may be null.
fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}
