//! The stored settings document.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::Product;

const DEFAULT_MIN_DEPARTURE_MINUTES: u32 = 0;
const DEFAULT_MAX_DEPARTURE_COUNT: u32 = 12;
const DEFAULT_SHOW_CANCELLED: bool = true;

/// Upper bound the configuration frontend allows for the lead-time filter.
const MAX_MIN_DEPARTURE_MINUTES: u32 = 30;

/// The station the board shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationChoice {
    /// Feed stop id, e.g. "900100003".
    pub id: String,

    /// Human-readable name, for logs and the frontend.
    #[serde(default)]
    pub name: String,

    /// Products to request; anything not listed is left out. Names the board
    /// does not know are skipped.
    #[serde(default, deserialize_with = "known_products")]
    pub enabled_products: BTreeSet<Product>,
}

/// Settings consumed by one refresh cycle.
///
/// Missing fields take their defaults, so a partially written document still
/// reads cleanly. A scalar of the wrong type or sign also falls back to its
/// default without disturbing the rest of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshSettings {
    /// `None` until a station has been configured.
    pub current_station: Option<StationChoice>,

    /// Hide departures leaving sooner than this. 0 disables the filter.
    #[serde(deserialize_with = "min_departure_minutes")]
    pub min_departure_minutes: u32,

    /// Number of departures to request and show.
    #[serde(deserialize_with = "max_departure_count")]
    pub max_departure_count: u32,

    /// Whether cancelled departures stay on the board (struck through).
    #[serde(deserialize_with = "show_cancelled_departures")]
    pub show_cancelled_departures: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            current_station: None,
            min_departure_minutes: DEFAULT_MIN_DEPARTURE_MINUTES,
            max_departure_count: DEFAULT_MAX_DEPARTURE_COUNT,
            show_cancelled_departures: DEFAULT_SHOW_CANCELLED,
        }
    }
}

impl RefreshSettings {
    /// Clamp values into the ranges the rest of the pipeline assumes.
    pub fn normalized(mut self) -> Self {
        self.min_departure_minutes = self.min_departure_minutes.min(MAX_MIN_DEPARTURE_MINUTES);
        self.max_departure_count = self.max_departure_count.max(1);
        self
    }

    /// The configured station, if any. A blank id counts as unconfigured.
    pub fn station(&self) -> Option<&StationChoice> {
        self.current_station.as_ref().filter(|s| !s.id.is_empty())
    }

    pub fn station_id(&self) -> Option<&str> {
        self.station().map(|s| s.id.as_str())
    }

    /// The lead-time filter, or `None` when disabled.
    pub fn min_lead_time(&self) -> Option<Duration> {
        (self.min_departure_minutes > 0)
            .then(|| Duration::minutes(i64::from(self.min_departure_minutes)))
    }
}

fn known_products<'de, D>(deserializer: D) -> Result<BTreeSet<Product>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(BTreeSet::new()),
        other => {
            warn!(value = %other, "enabledProducts is not a list, ignoring it");
            return Ok(BTreeSet::new());
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match item.as_str().map(Product::parse) {
            Some(Ok(product)) => Some(product),
            _ => {
                warn!(product = %item, "skipping unknown product");
                None
            }
        })
        .collect())
}

/// Read a scalar, keeping `default` when the stored value has the wrong shape.
fn scalar_or<'de, D, T>(deserializer: D, field: &str, default: T) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(&value).unwrap_or_else(|e| {
        warn!(field, %value, error = %e, "invalid setting, using default");
        default
    }))
}

fn min_departure_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    scalar_or(deserializer, "minDepartureMinutes", DEFAULT_MIN_DEPARTURE_MINUTES)
}

fn max_departure_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    scalar_or(deserializer, "maxDepartureCount", DEFAULT_MAX_DEPARTURE_COUNT)
}

fn show_cancelled_departures<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    scalar_or(deserializer, "showCancelledDepartures", DEFAULT_SHOW_CANCELLED)
}
