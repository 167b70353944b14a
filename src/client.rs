//! Blocking HTTP client for the Visual Crossing timeline endpoint.
//!
//! One GET per call: `{base_url}/{location}/{start}/{end}?key={api_key}`.
//! Transport failures are returned as errors; HTTP error statuses are
//! returned as `FetchOutcome::Rejected` so the caller sees the status code.

use std::time::Duration;

use chrono::NaiveDate;
use http::StatusCode;
use log::{debug, warn};
use serde_json::Value;

use crate::utils::percent_encode;

pub const DEFAULT_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Month-long hourly documents are a few MB; leave headroom.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug)]
pub enum WeatherClientError {
    /// Connection, timeout or I/O failure; no response is available.
    Transport(String),
    /// A 2xx response whose body is not JSON.
    Json(serde_json::Error),
}

impl core::fmt::Display for WeatherClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            WeatherClientError::Transport(s) => write!(f, "transport error: {}", s),
            WeatherClientError::Json(e) => write!(f, "json error: {}", e),
        }
    }
}

impl std::error::Error for WeatherClientError {}

impl From<serde_json::Error> for WeatherClientError {
    fn from(value: serde_json::Error) -> Self {
        WeatherClientError::Json(value)
    }
}

impl From<ureq::Error> for WeatherClientError {
    fn from(value: ureq::Error) -> Self {
        WeatherClientError::Transport(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Payload { status: StatusCode, payload: Value },
    Rejected { status: StatusCode },
}

impl FetchOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            FetchOutcome::Payload { status, .. } | FetchOutcome::Rejected { status } => *status,
        }
    }

    pub fn into_payload(self) -> Option<Value> {
        match self {
            FetchOutcome::Payload { payload, .. } => Some(payload),
            FetchOutcome::Rejected { .. } => None,
        }
    }
}

pub struct WeatherClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    unit_group: Option<String>,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_proxy(base_url, api_key, timeout, ureq::Proxy::try_from_env())
    }

    fn with_proxy(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        proxy: Option<ureq::Proxy>,
    ) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .proxy(proxy)
            .http_status_as_error(false)
            .build();

        WeatherClient {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into(),
            api_key: api_key.into(),
            unit_group: None,
        }
    }

    /// Ask for a unit group (`metric`, `us`, `uk`, `base`) instead of the API default.
    pub fn with_unit_group(mut self, unit_group: Option<String>) -> Self {
        self.unit_group = unit_group;
        self
    }

    pub fn url(&self, location: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            percent_encode(location),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        )
    }

    pub fn fetch(&self, location: &str, start: NaiveDate, end: NaiveDate) -> Result<FetchOutcome, WeatherClientError> {
        let url = self.url(location, start, end);
        debug!("GET {}", url);

        let mut req = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .query("key", &self.api_key);
        if let Some(unit_group) = &self.unit_group {
            req = req.query("unitGroup", unit_group);
        }

        let mut res = req.call().map_err(|e| {
            warn!("Weather request for {} failed: {}", location, e);
            WeatherClientError::from(e)
        })?;
        let status = res.status();
        let body = res.body_mut().with_config().limit(MAX_BODY_BYTES).read_to_string()?;

        if status.is_success() {
            let payload = serde_json::from_str(&body)?;
            Ok(FetchOutcome::Payload { status, payload })
        } else {
            warn!("Weather API returned http {} for {}: {}", status.as_u16(), location, body.trim());
            Ok(FetchOutcome::Rejected { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    /// Serve exactly one canned response, returning the request line to the test.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}/timeline", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 2 {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            )
            .unwrap();
            request_line
        });
        (base, handle)
    }

    #[test]
    fn url_joins_location_and_date_segments() {
        let client = WeatherClient::new("https://example.test/timeline/", "k", DEFAULT_TIMEOUT);
        assert_eq!(
            client.url("Toronto,CA", d("2023-12-01"), d("2024-01-01")),
            "https://example.test/timeline/Toronto%2CCA/2023-12-01/2024-01-01"
        );
    }

    #[test]
    fn success_returns_status_and_parsed_body() {
        let (base, server) = serve_once("200 OK", r#"{"latitude": 43.59, "days": []}"#);
        let client = WeatherClient::with_proxy(base, "secret", Duration::from_secs(5), None)
            .with_unit_group(Some("metric".into()));

        let outcome = client.fetch("Toronto,CA", d("2023-11-14"), d("2023-11-15")).unwrap();
        assert_eq!(outcome.status(), StatusCode::OK);
        assert_eq!(outcome.into_payload().unwrap()["latitude"], 43.59);

        let request_line = server.join().unwrap();
        assert!(
            request_line.starts_with("GET /timeline/Toronto%2CCA/2023-11-14/2023-11-15?"),
            "{}",
            request_line
        );
        assert!(request_line.contains("key=secret"), "{}", request_line);
        assert!(request_line.contains("unitGroup=metric"), "{}", request_line);
    }

    #[test]
    fn error_status_is_rejected_not_raised() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"error": "No account found"}"#);
        let client = WeatherClient::with_proxy(base, "bad", Duration::from_secs(5), None);

        let outcome = client.fetch("Toronto,CA", d("2023-11-14"), d("2023-11-15")).unwrap();
        assert_eq!(outcome, FetchOutcome::Rejected { status: StatusCode::UNAUTHORIZED });
        server.join().unwrap();
    }

    #[test]
    fn non_json_success_body_is_a_json_error() {
        let (base, server) = serve_once("200 OK", "not json");
        let client = WeatherClient::with_proxy(base, "k", Duration::from_secs(5), None);

        let err = client.fetch("x", d("2023-11-14"), d("2023-11-15")).unwrap_err();
        assert!(matches!(err, WeatherClientError::Json(_)), "{}", err);
        server.join().unwrap();
    }

    #[test]
    fn refused_connection_is_a_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let base = format!("http://127.0.0.1:{}", port);
        let client = WeatherClient::with_proxy(base, "k", Duration::from_secs(5), None);

        let err = client.fetch("x", d("2023-11-14"), d("2023-11-15")).unwrap_err();
        assert!(matches!(err, WeatherClientError::Transport(_)), "{}", err);
    }
}
