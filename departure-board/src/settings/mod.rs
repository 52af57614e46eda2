//! User settings: station choice and departure filters.
//!
//! Settings are written by the configuration frontend (not part of this
//! crate) and read fresh by every refresh cycle, so edits take effect on
//! the next refresh without a restart.

mod error;
mod model;
mod store;

pub use error::SettingsError;
pub use model::{RefreshSettings, StationChoice};
pub use store::{JsonFileSettingsStore, SettingsStore};
