//! crawldb: a polite, concurrent crawler that builds a persistent link graph
//!
//! This crate discovers, fetches, deduplicates and classifies pages, binary
//! documents and images inside an allow-listed set of domains, respecting
//! robots.txt, and folds the results into a SQLite crawl database.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for crawldb operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Failures of the fetch collaborator
///
/// Every variant means "resource unavailable" to the crawl; none of them is
/// fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },
}

/// Failures of the render collaborator
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Page unreachable: {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Render session failed for {url}: {reason}")]
    Session { url: String, reason: String },
}

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Crawler};
pub use state::{ContentHash, DataType, DedupRegistry, PageType};
pub use url::{canonical_domain, is_in_scope, root_url};
