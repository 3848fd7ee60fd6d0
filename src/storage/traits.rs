//! Storage traits and error types
//!
//! `CrawlStore` is the persistence façade used by the extraction pipeline.
//! It is implemented for `rusqlite::Connection`, so the same calls work on a
//! plain connection and, through deref, inside a `rusqlite::Transaction`.

use crate::state::{ContentHash, DataType, PageType};
use crate::storage::{ImageRecord, PageRecord, PageTransition, SiteRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid page transition for {url}: {from} -> {to}")]
    InvalidTransition {
        url: String,
        from: PageType,
        to: PageType,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence façade over the crawl graph
///
/// Every method takes `&self`; write atomicity across several calls is the
/// caller's job (open a transaction and call through it).
pub trait CrawlStore {
    // ===== Site Management =====

    /// Registers a site, keeping the first registration if it already exists
    ///
    /// # Arguments
    ///
    /// * `domain` - Canonical domain (no scheme, no `www.`)
    /// * `robots_content` - Raw robots.txt text, if one was fetched
    /// * `sitemap_content` - Newline-joined sitemap URLs from robots.txt
    ///
    /// # Returns
    ///
    /// The site ID (either newly created or existing)
    fn upsert_site(
        &self,
        domain: &str,
        robots_content: Option<&str>,
        sitemap_content: Option<&str>,
    ) -> StorageResult<i64>;

    /// Gets a site by canonical domain
    fn site_by_domain(&self, domain: &str) -> StorageResult<Option<SiteRecord>>;

    // ===== Page Management =====

    /// Creates a FRONTIER page for a URL unless a row already exists
    ///
    /// # Returns
    ///
    /// `(page_id, created)` where `created` is false if the URL already had a
    /// row, in whatever state
    fn create_page_frontier(&self, url: &str, site_id: Option<i64>) -> StorageResult<(i64, bool)>;

    /// Moves a page into a terminal state, creating the row if needed
    ///
    /// A FRONTIER row is updated in place; its site is kept if it had one.
    /// Fails with `InvalidTransition` if the row is already terminal or the
    /// target state is not terminal.
    fn transition_page(
        &self,
        url: &str,
        site_id: Option<i64>,
        transition: &PageTransition<'_>,
    ) -> StorageResult<i64>;

    /// Checks whether any row exists for the URL
    fn page_exists(&self, url: &str) -> StorageResult<bool>;

    /// Checks whether an HTML page with this content hash exists
    fn hash_exists(&self, hash: &ContentHash) -> StorageResult<bool>;

    /// Gets a page by URL
    fn page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    // ===== Link and Resource Management =====

    /// Inserts a link between two pages
    ///
    /// Returns false if the edge already existed.
    fn create_link(&self, from_page_id: i64, to_page_id: i64) -> StorageResult<bool>;

    /// Stores an image fetched from a page
    fn create_image(&self, page_id: i64, image: &ImageRecord) -> StorageResult<i64>;

    /// Stores the base64 payload of a BINARY page
    fn create_binary_resource(
        &self,
        page_id: i64,
        data_type: DataType,
        data: &str,
    ) -> StorageResult<i64>;

    // ===== Statistics =====

    /// Counts pages of one type
    fn count_pages_by_type(&self, page_type: PageType) -> StorageResult<u64>;

    fn count_sites(&self) -> StorageResult<u64>;

    fn count_links(&self) -> StorageResult<u64>;

    fn count_images(&self) -> StorageResult<u64>;

    fn count_binary_resources(&self) -> StorageResult<u64>;
}
