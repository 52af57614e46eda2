//! Departures feed HTTP client.
//!
//! Fetches a station's departures over one long-lived blocking HTTP client,
//! streaming the body into a fixed-capacity buffer, and applies the
//! connection failure policy: after a run of consecutive transport failures
//! the underlying client is thrown away and rebuilt.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{ErrorKind, Read};
use std::time::Duration;

use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::{debug, error, warn};

use crate::domain::{Product, Trip};

use super::buffer::{BufferOverflow, ResponseBuffer};
use super::convert::convert_departures;
use super::error::FeedError;
use super::source::TripSource;
use super::types::DeparturesResponse;

/// Default base URL of the departures API.
const DEFAULT_BASE_URL: &str = "https://v6.bvg.transport.rest";

const DEFAULT_USER_AGENT: &str = concat!("departure-board/", env!("CARGO_PKG_VERSION"));

/// Largest observed response at 20 results is ~23 KB.
pub const DEFAULT_BUFFER_CAPACITY: usize = 30 * 1024;

const DEFAULT_TIMEOUT_MS: u64 = 8000;

const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Minutes ahead of now the board asks for.
const DEFAULT_WINDOW_MINUTES: u32 = 60;

/// Bytes read from the socket per call.
const CHUNK_SIZE: usize = 1024;

/// How much of an unparseable body to keep for the log.
const BODY_SNIPPET_LEN: usize = 500;

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Base URL for the API (defaults to the public BVG endpoint)
    pub base_url: String,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Receive buffer size in bytes
    pub buffer_capacity: usize,
    /// Consecutive transport failures before the connection is rebuilt
    pub failure_threshold: u32,
    /// Departure window requested from the API, in minutes
    pub window_minutes: u32,
}

impl FeedConfig {
    /// Create a config with production defaults.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            window_minutes: DEFAULT_WINDOW_MINUTES,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set receive buffer size.
    pub fn with_buffer_capacity(mut self, bytes: usize) -> Self {
        self.buffer_capacity = bytes;
        self
    }

    /// Set the consecutive failure threshold.
    pub fn with_failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n.max(1);
        self
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Departures API client.
///
/// Not `Clone` and not shared: the refresh worker owns the only instance,
/// which makes the failure counter and connection resets single-threaded.
#[derive(Debug)]
pub struct FeedClient {
    http: reqwest::blocking::Client,
    config: FeedConfig,
    buffer: ResponseBuffer,
    consecutive_failures: u32,
    connection_resets: u64,
}

impl FeedClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        let http = build_http(&config)?;
        let buffer = ResponseBuffer::with_capacity(config.buffer_capacity);

        Ok(Self {
            http,
            config,
            buffer,
            consecutive_failures: 0,
            connection_resets: 0,
        })
    }

    /// Transport failures since the last completed exchange or reset.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// How many times the connection has been rebuilt.
    pub fn connection_resets(&self) -> u64 {
        self.connection_resets
    }

    /// Build the request URL for a station.
    ///
    /// Parameters are emitted in key order, so the same inputs always give
    /// byte-identical URLs. Every known product gets an explicit flag; only
    /// the enabled ones are `true`.
    pub fn build_url(
        &self,
        station_id: &str,
        enabled_products: &BTreeSet<Product>,
        max_results: u32,
    ) -> Result<Url, FeedError> {
        if station_id.is_empty() || station_id.contains(['/', '?', '#']) {
            return Err(FeedError::InvalidUrl(format!(
                "bad station id {station_id:?}"
            )));
        }

        let mut params: BTreeMap<&str, String> = BTreeMap::new();
        params.insert("results", max_results.max(1).to_string());
        params.insert("pretty", "false".to_string());
        params.insert("remarks", "false".to_string());
        params.insert("duration", self.config.window_minutes.to_string());
        for product in Product::ALL {
            params.insert(
                product.as_str(),
                enabled_products.contains(&product).to_string(),
            );
        }

        let base = format!(
            "{}/stops/{}/departures",
            self.config.base_url.trim_end_matches('/'),
            station_id
        );

        Url::parse_with_params(&base, params.iter()).map_err(|e| FeedError::InvalidUrl(e.to_string()))
    }

    /// Fetch departures, reporting failures as errors.
    ///
    /// Failure bookkeeping (counter, connection reset) happens here as well,
    /// so this and [`TripSource::fetch_trips`] behave identically apart from
    /// how they report the outcome.
    pub fn try_fetch_trips(
        &mut self,
        station_id: &str,
        enabled_products: &BTreeSet<Product>,
        max_results: u32,
    ) -> Result<Vec<Trip>, FeedError> {
        let url = self.build_url(station_id, enabled_products, max_results)?;
        debug!(%url, "fetching departures");

        let result = self
            .download(url)
            .and_then(|()| parse_departures(self.buffer.as_bytes()));
        self.buffer.clear();

        if let Err(e) = &result
            && e.is_transport()
        {
            self.record_transport_failure(e);
        }
        result
    }

    /// Perform the GET and stream the body into the receive buffer.
    fn download(&mut self, url: Url) -> Result<(), FeedError> {
        self.buffer.clear();

        let mut response = self.http.get(url).send()?;

        let status = response.status();
        if !status.is_success() {
            // The connection itself worked
            self.consecutive_failures = 0;
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }

        if let Some(len) = response.content_length()
            && len > self.buffer.capacity() as u64
        {
            return Err(FeedError::Overflow(BufferOverflow {
                capacity: self.buffer.capacity(),
                attempted: usize::try_from(len).unwrap_or(usize::MAX),
            }));
        }

        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            let n = match response.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FeedError::Read(e)),
            };
            // Bail out on the first chunk that doesn't fit; dropping the
            // response closes the connection mid-body.
            self.buffer.extend(&chunk[..n])?;
        }

        debug!(bytes = self.buffer.len(), "response received");
        self.consecutive_failures = 0;
        Ok(())
    }

    fn record_transport_failure(&mut self, err: &FeedError) {
        self.consecutive_failures += 1;
        error!(
            error = %err,
            consecutive_failures = self.consecutive_failures,
            "departures request failed"
        );

        if self.consecutive_failures >= self.config.failure_threshold {
            warn!(
                consecutive_failures = self.consecutive_failures,
                "too many consecutive failures, resetting connection"
            );
            self.reset_connection();
        }
    }

    /// Drop the HTTP client (and its pooled connections) and build a new one.
    fn reset_connection(&mut self) {
        match build_http(&self.config) {
            Ok(http) => {
                self.http = http;
                self.connection_resets += 1;
            }
            // Keep the old client; the next threshold crossing retries.
            Err(e) => error!(error = %e, "failed to rebuild HTTP client"),
        }
        self.buffer.clear();
        self.consecutive_failures = 0;
    }
}

impl TripSource for FeedClient {
    fn fetch_trips(
        &mut self,
        station_id: &str,
        enabled_products: &BTreeSet<Product>,
        max_results: u32,
    ) -> Vec<Trip> {
        match self.try_fetch_trips(station_id, enabled_products, max_results) {
            Ok(trips) => {
                debug!(count = trips.len(), "parsed departures");
                trips
            }
            // Already logged with the failure count
            Err(e) if e.is_transport() => Vec::new(),
            Err(FeedError::Json { message, body }) => {
                error!(%message, body = body.as_deref().unwrap_or(""), "failed to parse departures");
                Vec::new()
            }
            Err(e) => {
                error!(error = %e, "departures request failed");
                Vec::new()
            }
        }
    }
}

fn build_http(config: &FeedConfig) -> Result<reqwest::blocking::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    reqwest::blocking::Client::builder()
        .default_headers(headers)
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
}

/// Parse a raw departures response body into trips.
pub fn parse_departures(body: &[u8]) -> Result<Vec<Trip>, FeedError> {
    let resp: DeparturesResponse = serde_json::from_slice(body).map_err(|e| FeedError::Json {
        message: e.to_string(),
        body: Some(
            String::from_utf8_lossy(&body[..body.len().min(BODY_SNIPPET_LEN)]).into_owned(),
        ),
    })?;

    Ok(convert_departures(&resp)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::TextBoard;
    use crate::reconcile::{ReconcileOutcome, Reconciler};
    use crate::settings::RefreshSettings;
    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::sync::mpsc;
    use std::thread;

    const TWO_DEPARTURES: &str = r#"{"departures":[
        {"tripId":"t1","direction":"S+U Wittenau","line":{"name":"U8","product":"subway"},
         "when":"2025-03-15T12:07:00+01:00","plannedWhen":"2025-03-15T12:05:00+01:00"},
        {"tripId":"t2","direction":"U Hermannstr.","line":{"name":"U8","product":"subway"},
         "when":null,"plannedWhen":"2025-03-15T12:10:00+01:00"}
    ]}"#;

    fn ok_response(body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
        .into_bytes()
    }

    /// A body with no Content-Length, delimited by connection close.
    fn unsized_response(body: &str) -> Vec<u8> {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n{body}"
        )
        .into_bytes()
    }

    fn status_response(status: &str) -> Vec<u8> {
        format!("HTTP/1.1 {status}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").into_bytes()
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut request = Vec::new();
        let mut byte = [0u8; 1];
        while !request.ends_with(b"\r\n\r\n") {
            match std::io::Read::read(stream, &mut byte) {
                Ok(1) => request.push(byte[0]),
                _ => break,
            }
        }
        String::from_utf8_lossy(&request).into_owned()
    }

    /// Serve the given raw responses, one per connection, and report the
    /// request heads that came in.
    fn serve(responses: Vec<Vec<u8>>) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            for raw in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                let _ = tx.send(read_request(&mut stream));
                // The client may hang up mid-body on purpose
                let _ = stream.write_all(&raw);
            }
        });

        (format!("http://{addr}"), rx)
    }

    fn closed_port_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn products(list: &[Product]) -> BTreeSet<Product> {
        list.iter().copied().collect()
    }

    fn client(base_url: &str) -> FeedClient {
        FeedClient::new(
            FeedConfig::new()
                .with_base_url(base_url)
                .with_timeout_ms(2000),
        )
        .unwrap()
    }

    #[test]
    fn config_builder() {
        let config = FeedConfig::new()
            .with_base_url("http://localhost:8080")
            .with_timeout_ms(500)
            .with_buffer_capacity(1024)
            .with_failure_threshold(5);

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.buffer_capacity, 1024);
        assert_eq!(config.failure_threshold, 5);
    }

    #[test]
    fn config_defaults() {
        let config = FeedConfig::default();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_ms, 8000);
        assert_eq!(config.buffer_capacity, 30 * 1024);
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.window_minutes, 60);
    }

    #[test]
    fn url_is_canonical() {
        let client = client(DEFAULT_BASE_URL);
        let url = client
            .build_url("900100003", &products(&[Product::Subway]), 2)
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://v6.bvg.transport.rest/stops/900100003/departures?\
             bus=false&duration=60&express=false&ferry=false&pretty=false&regional=false&\
             remarks=false&results=2&suburban=false&subway=true&tram=false"
        );
    }

    #[test]
    fn url_does_not_depend_on_product_order() {
        let client = client(DEFAULT_BASE_URL);
        let a = client
            .build_url("1", &products(&[Product::Tram, Product::Bus]), 12)
            .unwrap();
        let b = client
            .build_url("1", &products(&[Product::Bus, Product::Tram]), 12)
            .unwrap();

        assert_eq!(a, b);
        assert!(a.as_str().contains("bus=true"));
        assert!(a.as_str().contains("tram=true"));
        assert!(a.as_str().contains("subway=false"));
    }

    #[test]
    fn url_rejects_bad_station_ids() {
        let client = client(DEFAULT_BASE_URL);
        assert!(client.build_url("", &BTreeSet::new(), 5).is_err());
        assert!(client.build_url("../admin", &BTreeSet::new(), 5).is_err());
        assert!(client.build_url("1?x=y", &BTreeSet::new(), 5).is_err());
    }

    #[test]
    fn fetches_and_parses() {
        let (base, requests) = serve(vec![ok_response(TWO_DEPARTURES)]);
        let mut client = client(&base);

        let trips = client.fetch_trips("900100003", &products(&[Product::Subway]), 2);

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].trip_id.as_str(), "t1");
        assert!(!trips[0].is_cancelled());
        assert!(trips[1].is_cancelled());
        assert_eq!(client.consecutive_failures(), 0);

        let head = requests.recv().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("get /stops/900100003/departures?bus=false&duration=60"));
        assert!(head.contains("accept: application/json"));
        assert!(head.contains("user-agent: departure-board/"));
    }

    #[test]
    fn subway_only_station_reaches_the_board() {
        const SUBWAY_PAIR: &str = r#"{"departures":[
            {"tripId":"u8-late","direction":"S+U Wittenau","line":{"name":"U8","product":"subway"},
             "when":"2025-03-15T12:09:00+01:00","plannedWhen":"2025-03-15T12:09:00+01:00"},
            {"tripId":"u8-soon","direction":"U Hermannstr.","line":{"name":"U8","product":"subway"},
             "when":"2025-03-15T12:03:00+01:00","plannedWhen":"2025-03-15T12:02:00+01:00"}
        ]}"#;

        let (base, requests) = serve(vec![ok_response(SUBWAY_PAIR)]);
        let mut client = client(&base);
        let settings: RefreshSettings = serde_json::from_str(
            r#"{"currentStation": {"id": "900100003", "enabledProducts": ["subway"]},
                "maxDepartureCount": 2}"#,
        )
        .unwrap();
        let station = settings.station().unwrap();

        let trips = client.fetch_trips(
            &station.id,
            &station.enabled_products,
            settings.max_departure_count,
        );

        let head = requests.recv().unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.contains("bus=false"));
        assert!(request_line.contains("subway=true"));
        assert!(request_line.contains("tram=false"));
        assert!(request_line.contains("results=2"));

        let now = crate::domain::parse_wire_time("2025-03-15T12:00:00+01:00").unwrap();
        let mut board = TextBoard::new(Vec::new());
        let outcome = Reconciler::apply(&mut board, &trips, &settings, now);

        assert!(matches!(outcome, ReconcileOutcome::Applied(summary) if summary.created == 2));
        let order: Vec<&str> = board.row_order().iter().map(|id| id.as_str()).collect();
        assert_eq!(order, vec!["u8-soon", "u8-late"]);
        assert_eq!(board.row(&trips[1].trip_id).unwrap().countdown, "3'");
        assert_eq!(board.row(&trips[0].trip_id).unwrap().countdown, "9'");
    }

    #[test]
    fn oversized_response_is_never_parsed() {
        let body = format!(
            r#"{{"departures":[],"padding":"{}"}}"#,
            "x".repeat(4096)
        );
        let (base, _requests) = serve(vec![ok_response(&body)]);
        let mut client =
            FeedClient::new(FeedConfig::new().with_base_url(base).with_buffer_capacity(1024)).unwrap();

        let err = client
            .try_fetch_trips("1", &BTreeSet::new(), 12)
            .unwrap_err();

        assert!(matches!(err, FeedError::Overflow(_)));
        assert_eq!(client.consecutive_failures(), 1);
    }

    #[test]
    fn oversized_streamed_response_is_never_parsed() {
        // No Content-Length, so the overflow is only found while streaming.
        // The first 1 KiB is a complete, valid document: parsing a partial
        // buffer would wrongly succeed.
        let mut body = r#"{"departures":[]}"#.to_string();
        body.push_str(&" ".repeat(4096));
        let (base, _requests) = serve(vec![unsized_response(&body)]);
        let mut client =
            FeedClient::new(FeedConfig::new().with_base_url(base).with_buffer_capacity(1024)).unwrap();

        let err = client
            .try_fetch_trips("1", &BTreeSet::new(), 12)
            .unwrap_err();

        assert!(matches!(err, FeedError::Overflow(_)), "got {err:?}");
        assert_eq!(client.consecutive_failures(), 1);
    }

    #[test]
    fn malformed_json_yields_nothing_and_is_not_a_transport_failure() {
        let (base, _requests) = serve(vec![ok_response("{\"departures\": [")]);
        let mut client = client(&base);

        let err = client
            .try_fetch_trips("1", &BTreeSet::new(), 12)
            .unwrap_err();
        assert!(matches!(err, FeedError::Json { .. }));
        assert_eq!(client.consecutive_failures(), 0);
    }

    #[test]
    fn error_status_yields_nothing() {
        let (base, _requests) = serve(vec![status_response("503 Service Unavailable")]);
        let mut client = client(&base);

        let trips = client.fetch_trips("1", &BTreeSet::new(), 12);
        assert!(trips.is_empty());
        assert_eq!(client.consecutive_failures(), 0);
    }

    #[test]
    fn three_failures_reset_the_connection() {
        let mut client = client(&closed_port_url());

        assert!(client.fetch_trips("1", &BTreeSet::new(), 12).is_empty());
        assert_eq!(client.consecutive_failures(), 1);
        assert!(client.fetch_trips("1", &BTreeSet::new(), 12).is_empty());
        assert_eq!(client.consecutive_failures(), 2);
        assert_eq!(client.connection_resets(), 0);

        assert!(client.fetch_trips("1", &BTreeSet::new(), 12).is_empty());
        assert_eq!(client.consecutive_failures(), 0);
        assert_eq!(client.connection_resets(), 1);

        // The fourth call starts counting from scratch on the new connection
        assert!(client.fetch_trips("1", &BTreeSet::new(), 12).is_empty());
        assert_eq!(client.consecutive_failures(), 1);
        assert_eq!(client.connection_resets(), 1);
    }

    #[test]
    fn fourth_call_after_reset_succeeds() {
        let big = format!(r#"{{"departures":[],"padding":"{}"}}"#, "x".repeat(2048));
        let (base, _requests) = serve(vec![
            ok_response(&big),
            ok_response(&big),
            ok_response(&big),
            ok_response(TWO_DEPARTURES),
        ]);
        let mut client =
            FeedClient::new(FeedConfig::new().with_base_url(base).with_buffer_capacity(1024)).unwrap();

        for _ in 0..3 {
            assert!(client.fetch_trips("1", &BTreeSet::new(), 12).is_empty());
        }
        assert_eq!(client.connection_resets(), 1);
        assert_eq!(client.consecutive_failures(), 0);

        let trips = client.fetch_trips("1", &BTreeSet::new(), 12);
        assert_eq!(trips.len(), 2);
        assert_eq!(client.consecutive_failures(), 0);
        assert_eq!(client.connection_resets(), 1);
    }

    #[test]
    fn success_clears_failure_count() {
        let big = format!(r#"{{"padding":"{}"}}"#, "x".repeat(2048));
        let (base, _requests) = serve(vec![ok_response(&big), ok_response(TWO_DEPARTURES)]);
        let mut client =
            FeedClient::new(FeedConfig::new().with_base_url(base).with_buffer_capacity(1024)).unwrap();

        assert!(client.fetch_trips("1", &BTreeSet::new(), 12).is_empty());
        assert_eq!(client.consecutive_failures(), 1);

        assert_eq!(client.fetch_trips("1", &BTreeSet::new(), 12).len(), 2);
        assert_eq!(client.consecutive_failures(), 0);
    }

    #[test]
    fn parse_departures_keeps_body_snippet() {
        let err = parse_departures(b"<html>rate limited</html>").unwrap_err();
        match err {
            FeedError::Json { body, .. } => {
                assert_eq!(body.as_deref(), Some("<html>rate limited</html>"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
