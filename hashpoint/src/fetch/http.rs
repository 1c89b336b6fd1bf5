//! HTTP client abstraction for testability.

use std::time::Duration;

use thiserror::Error;

/// Default per-request timeout in seconds. The timeout is the only abort
/// mechanism a fetch has: once it fires, the in-flight request is torn
/// down and the mirror counts as failed.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// A raw HTTP response: status code plus body bytes.
///
/// Non-success statuses are not errors at this layer; the fetcher needs
/// the status code to tell "no such resource" apart from server trouble.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Convenience constructor for a 200 response.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Errors raised below the HTTP status level: DNS, connect, timeout.
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Trait for HTTP GET operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// Returns the response whatever its status code; only transport-level
    /// failures (including the timeout abort) are errors.
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with the default per-request timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with a custom per-request timeout.
    ///
    /// The timeout covers the whole request, so a stalled mirror is
    /// force-aborted rather than held onto.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HttpError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| HttpError::Transport(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| HttpError::Transport(format!("failed to read response: {e}")))?;

        Ok(HttpResponse { status, body })
    }
}
