//! Feed client error types.

use super::buffer::BufferOverflow;
use super::convert::ConversionError;

/// Errors from a single departures fetch.
///
/// None of these reach the refresh loop: the client logs them and reports
/// an empty trip list. The variants exist so the failure policy can tell
/// transport problems (which count towards a connection reset) from
/// everything else.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Connect, DNS, TLS or timeout failure before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reading the response body failed part-way
    #[error("failed to read response body: {0}")]
    Read(#[source] std::io::Error),

    /// Response body did not fit the receive buffer
    #[error(transparent)]
    Overflow(#[from] BufferOverflow),

    /// API answered with a non-success status code
    #[error("API error {status}")]
    Status { status: u16 },

    /// Response body was not the JSON we expect
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// JSON was well-formed but a field held an unusable value
    #[error("invalid departure data: {0}")]
    Conversion(#[from] ConversionError),

    /// Request URL could not be built
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Fixture data for the mock feed could not be loaded
    #[error("mock data: {0}")]
    MockData(String),
}

impl FeedError {
    /// Whether this failure says something about the connection itself.
    ///
    /// Only these count towards the consecutive-failure threshold.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FeedError::Http(_) | FeedError::Read(_) | FeedError::Overflow(_)
        )
    }
}
