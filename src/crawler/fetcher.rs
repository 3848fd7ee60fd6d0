//! HTTP fetcher implementation
//!
//! The `Fetcher` trait is the fetch collaborator used for robots.txt,
//! sitemaps, status probes, binary documents and images. `HttpFetcher` is the
//! reqwest-backed implementation.

use crate::config::UserAgentConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;

/// Maximum number of redirects followed by the HTTP client
const MAX_REDIRECTS: usize = 10;

/// Raw response of a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status_code: u16,
    /// Value of the `Content-Type` header, if present
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Returns true for 2xx status codes
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Fetch collaborator: `get(url) -> {status, body}`
///
/// Any error means "resource unavailable"; callers skip the resource.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use crawldb::config::UserAgentConfig;
/// use crawldb::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "crawldb".to_string(),
///     crawler_version: "0.1.0".to_string(),
///     contact_url: "https://example.gov.si/crawler".to_string(),
///     contact_email: "crawler@example.gov.si".to_string(),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetch collaborator
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| classify_error(url, e))?
            .to_vec();

        Ok(FetchResponse {
            status_code,
            content_type,
            body,
        })
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
pub(crate) fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if error.is_timeout() {
        FetchError::Timeout { url }
    } else if error.is_connect() {
        FetchError::Connect { url }
    } else {
        FetchError::Http { url, source: error }
    }
}
