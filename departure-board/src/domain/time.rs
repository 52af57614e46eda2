//! Time handling for the departures feed.
//!
//! The feed provides instants as ISO-8601 date-time strings with a UTC
//! offset (e.g. "2025-03-15T14:30:00+01:00"). This module turns those into
//! `DateTime<Utc>` values, which compare correctly across offset changes,
//! and provides the `Clock` abstraction the refresh pipeline reads "now"
//! from.

use chrono::{DateTime, Utc};

/// Error returned when parsing an invalid wire timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timestamp {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: String,
}

impl TimeError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// Parse a wire-format timestamp into a UTC instant.
///
/// # Examples
///
/// ```
/// use departure_board::domain::parse_wire_time;
///
/// let t = parse_wire_time("2025-03-15T14:30:00+01:00").unwrap();
/// assert_eq!(t.to_rfc3339(), "2025-03-15T13:30:00+00:00");
///
/// // Offsets are mandatory
/// assert!(parse_wire_time("2025-03-15T14:30:00").is_err());
/// assert!(parse_wire_time("14:30").is_err());
/// ```
pub fn parse_wire_time(s: &str) -> Result<DateTime<Utc>, TimeError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TimeError::new(s, e.to_string()))
}

/// Source of the current instant.
///
/// Production code uses [`SystemClock`].
pub trait Clock {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock, as kept in sync by the platform.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
pub use fixed::FixedClock;


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn parses_offsets_to_utc() {
        let summer = parse_wire_time("2025-07-01T08:00:00+02:00").unwrap();
        let winter = parse_wire_time("2025-01-01T08:00:00+01:00").unwrap();

        assert_eq!(summer.to_rfc3339(), "2025-07-01T06:00:00+00:00");
        assert_eq!(winter.to_rfc3339(), "2025-01-01T07:00:00+00:00");
    }

    #[test]
    fn instants_compare_across_offsets() {
        let a = parse_wire_time("2025-03-30T01:59:00+01:00").unwrap();
        let b = parse_wire_time("2025-03-30T03:00:00+02:00").unwrap();

        assert!(a < b);
        assert_eq!(b - a, Duration::minutes(1));
    }

    #[test]
    fn rejects_garbage() {
        let err = parse_wire_time("not a time").unwrap_err();
        assert!(err.to_string().contains("not a time"));
        assert!(parse_wire_time("").is_err());
    }

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let start = parse_wire_time("2025-03-15T12:00:00Z").unwrap();
        let clock = FixedClock::new(start);

        assert_eq!(clock.now(), start);
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));
        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
