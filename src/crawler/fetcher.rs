//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scanner, including:
//! - The `Fetcher` capability the layer executor depends on
//! - Building HTTP clients from `FetcherConfig`
//! - Mapping failures to `FetchError`

use crate::config::FetcherConfig;
use crate::{FetchError, FetchResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Retrieves the content of a page
///
/// Implementations hold no per-run state and may be called concurrently.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the body of `url`, or the reason it could not be retrieved
    async fn fetch(&self, url: &str) -> FetchResult<String>;
}

/// [`Fetcher`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher with the timeouts and user agent from `config`
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<String> {
        fetch_url(&self.client, url).await
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use ripple_scan::config::FetcherConfig;
/// use ripple_scan::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body as text
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | `Ok(body)` |
/// | any other status | `FetchError::Status` |
/// | timeout | `FetchError::Timeout` |
/// | connection / TLS / DNS failure | `FetchError::Request` |
/// | unreadable body | `FetchError::Body` |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult<String> {
    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        tracing::debug!("{} answered {}", url, status);
        return Err(FetchError::Status {
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Body(e.to_string())
        }
    })
}
