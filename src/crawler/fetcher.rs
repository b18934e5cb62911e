//! HTTP fetcher implementation
//!
//! This module handles all page retrieval for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests to fetch page content
//! - Classifying failures into non-success responses, timeouts and
//!   transport errors

use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use thiserror::Error;
use url::Url;

/// Maximum redirect hops followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Reasons a page could not be retrieved
///
/// Every variant is a per-URL outcome: the engine logs it and moves on to
/// the next URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a status outside 2xx
    #[error("Non-success response [{status}]")]
    NonSuccess { status: u16 },

    /// Connecting or receiving the response took longer than allowed
    #[error("Request timeout")]
    Timeout,

    /// Connection refused, DNS failure, TLS error, ...
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be read or decoded
    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Retrieves page content for the crawl engine
///
/// Implementations must bound the time a single fetch may take and return
/// the content lowercased, so keyword matching is plain containment.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use keyword_crawler::config::FetcherConfig;
/// use keyword_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.connect_timeout())
        .timeout(config.read_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        fetch_page(&self.client, url).await
    }
}

/// Fetches a URL and returns its lowercased body
///
/// # Error Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP status outside 2xx | `NonSuccess { status }` |
/// | Connect or response timeout | `Timeout` |
/// | Connection refused, DNS, TLS, redirect limit | `Network` |
/// | Body read/decode failure | `Body` |
///
/// No retries are attempted.
pub async fn fetch_page(client: &Client, url: &Url) -> Result<String, FetchError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(classify_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::NonSuccess {
            status: status.as_u16(),
        });
    }

    let body = response.text().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Body(e.to_string())
        }
    })?;

    Ok(body.to_lowercase())
}

fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(e.to_string())
    }
}
