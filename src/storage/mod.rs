//! Storage module for persisting the crawl graph
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Site registration and page lifecycle transitions
//! - Link, image and binary payload persistence

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{CrawlStore, StorageError, StorageResult};

use crate::state::{ContentHash, PageType};
use chrono::{DateTime, Utc};

/// Represents a site in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteRecord {
    pub id: i64,
    pub domain: String,
    pub robots_content: Option<String>,
    pub sitemap_content: Option<String>,
}

/// Represents a page in the database
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub id: i64,
    pub site_id: Option<i64>,
    pub url: String,
    pub page_type: PageType,
    pub html_content: Option<String>,
    pub http_status_code: Option<u16>,
    pub accessed_time: Option<String>,
    pub hash: Option<ContentHash>,
}

/// Terminal state a fetched page moves into, with its fetch results
#[derive(Debug, Clone)]
pub struct PageTransition<'a> {
    pub page_type: PageType,
    pub hash: Option<ContentHash>,
    /// Only stored for HTML pages
    pub html_content: Option<&'a str>,
    pub http_status_code: Option<u16>,
    pub accessed_at: DateTime<Utc>,
}

/// An image fetched from a page, ready to store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub filename: String,
    pub content_type: Option<String>,
    /// Base64-encoded bytes
    pub data: String,
    pub accessed_at: DateTime<Utc>,
}
