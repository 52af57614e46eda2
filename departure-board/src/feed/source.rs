//! The seam between the refresh cycle and wherever trips come from.

use std::collections::BTreeSet;

use crate::domain::{Product, Trip};

/// Trait for providing departures.
///
/// This abstraction allows the refresh cycle to be driven by the live feed,
/// by fixture data, or by test doubles.
pub trait TripSource {
    /// Fetch up to `max_results` upcoming departures at `station_id`,
    /// restricted to `enabled_products`, in feed order.
    ///
    /// Returns an empty list on any failure. Empty is the uniform "nothing
    /// to show" signal; implementations log the cause themselves.
    fn fetch_trips(
        &mut self,
        station_id: &str,
        enabled_products: &BTreeSet<Product>,
        max_results: u32,
    ) -> Vec<Trip>;
}

impl<T: TripSource + ?Sized> TripSource for Box<T> {
    fn fetch_trips(
        &mut self,
        station_id: &str,
        enabled_products: &BTreeSet<Product>,
        max_results: u32,
    ) -> Vec<Trip> {
        (**self).fetch_trips(station_id, enabled_products, max_results)
    }
}
