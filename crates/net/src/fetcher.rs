//! The HTTP boundary: a pluggable fetcher trait and the default
//! blocking-client implementation.

use log::debug;
use std::time::{Duration, Instant};

/// User agent sent by the default fetcher.
const USER_AGENT: &str = "vellum/0.1 (StaticHTMLCSS)";
/// Request timeout applied by the default fetcher.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What one fetch produced, success or not.
///
/// Contract: a non-empty `error` or a status outside 200–299 means
/// failure; `final_url` defaults to the requested URL when empty;
/// `timed_out` implies failure.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// HTTP status code; 0 when the request never completed.
    pub status_code: u16,
    /// Canonical reason phrase for the status, when known.
    pub reason: String,
    /// Response body as text.
    pub body: String,
    /// Transport-level failure description; empty on success.
    pub error: String,
    /// URL after redirects; empty means "same as requested".
    pub final_url: String,
    /// Wall-clock duration of the whole fetch.
    pub total_duration_seconds: f64,
    /// True when the request hit the client timeout.
    pub timed_out: bool,
}

/// Anything that can fetch an http(s) URL.
pub trait Fetcher {
    /// Fetch `url`, reporting the outcome and timing in the response.
    fn fetch(&self, url: &str) -> FetchResponse;
}

/// The default fetcher over a blocking HTTP client.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a fetcher with the standard timeout and user agent.
    #[must_use]
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> FetchResponse {
        let started = Instant::now();
        let mut response = FetchResponse::default();

        match self.client.get(url).send() {
            Ok(http_response) => {
                let status = http_response.status();
                response.status_code = status.as_u16();
                response.reason = status.canonical_reason().unwrap_or_default().to_owned();
                response.final_url = http_response.url().to_string();
                match http_response.text() {
                    Ok(body) => response.body = body,
                    Err(err) => {
                        response.timed_out = err.is_timeout();
                        response.error = format!("Failed to read response body: {err}");
                    }
                }
            }
            Err(err) => {
                response.timed_out = err.is_timeout();
                response.error = err.to_string();
            }
        }

        response.total_duration_seconds = started.elapsed().as_secs_f64();
        debug!(
            "fetch {url}: status={} timed_out={} duration={:.3}s",
            response.status_code, response.timed_out, response.total_duration_seconds
        );
        response
    }
}
