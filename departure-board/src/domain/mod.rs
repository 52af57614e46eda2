//! Domain types for the departure board.
//!
//! Trips, products and instants as the rest of the crate sees them. Wire
//! formats are converted into these types at the feed boundary, so code
//! that receives them can trust their validity.

mod product;
mod time;
mod trip;

pub use product::{Product, Rgb, UnknownProduct, badge_color};
#[cfg(test)]
pub use time::FixedClock;
pub use time::{Clock, SystemClock, TimeError, parse_wire_time};
pub use trip::{Trip, TripId};
