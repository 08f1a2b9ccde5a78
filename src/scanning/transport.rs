//! HTTP transport used by the content fetcher and the size resolver
//!
//! The trait keeps the network behind a seam so retry, caching and
//! batching logic can be exercised without a live server.

use async_trait::async_trait;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_LENGTH};
use reqwest::redirect::Policy;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::validate::check_url;

/// Errors raised below the HTTP status level
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Minimal view of an HTTP response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Value of the Content-Length header, if present and numeric
    pub content_length: Option<u64>,
    /// Response body (empty for HEAD requests)
    pub body: String,
}

impl TransportResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            content_length: None,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_length: None,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam for GET and HEAD requests
#[async_trait]
pub trait HttpTransport: Send + Sync + Debug {
    /// Issue a GET and read the body as text
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError>;

    /// Issue a HEAD and read only the headers
    async fn head(&self, url: &Url) -> Result<TransportResponse, TransportError>;
}

/// Configuration for the reqwest-backed transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string
    pub user_agent: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Idle connections kept per host
    pub connections_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 10,
            connections_per_host: 10,
        }
    }
}

/// [`HttpTransport`] backed by pooled `reqwest` clients.
///
/// Page fetches and HEAD probes use separate clients. The probe client never
/// decompresses, since decoding strips Content-Length, and refuses redirects
/// into local or private networks.
///
/// Whole-request timeouts are applied by the callers, not here.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    probe_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.connections_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(config.max_redirects))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()?;

        let probe_client = reqwest::Client::builder()
            .pool_max_idle_per_host(config.connections_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(config.connect_timeout)
            .redirect(public_redirects(config.max_redirects))
            .user_agent(&config.user_agent)
            .gzip(false)
            .brotli(false)
            .build()?;

        Ok(Self {
            client,
            probe_client,
        })
    }
}

/// Follow up to `max` redirects, stopping at any hop that fails URL validation
fn public_redirects(max: usize) -> Policy {
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= max {
            return attempt.error(format!("too many redirects (max {})", max));
        }
        match check_url(attempt.url()) {
            Ok(()) => attempt.follow(),
            Err(e) => {
                tracing::debug!("Refusing redirect to {}: {}", attempt.url(), e);
                attempt.error(e.to_string())
            }
        }
    })
}

/// Read Content-Length straight from the headers; reqwest reports the body
/// size hint instead, which is zero for HEAD responses.
fn header_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let response = self.client.get(url.as_str()).send().await?;
        let status = response.status().as_u16();
        let content_length = header_content_length(&response);
        let body = response.text().await?;

        Ok(TransportResponse {
            status,
            content_length,
            body,
        })
    }

    async fn head(&self, url: &Url) -> Result<TransportResponse, TransportError> {
        let response = self
            .probe_client
            .head(url.as_str())
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .await?;

        Ok(TransportResponse {
            status: response.status().as_u16(),
            content_length: header_content_length(&response),
            body: String::new(),
        })
    }
}
