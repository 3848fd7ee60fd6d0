//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The fetch and render collaborators
//! - HTML resource extraction and link classification
//! - The shared frontier with idle termination
//! - Overall crawl coordination over a worker pool

mod coordinator;
mod extract;
mod fetcher;
mod parser;
mod render;
mod scheduler;

pub use coordinator::{CrawlContext, CrawlReport, Crawler};
pub use extract::{
    classify_link, content_hash, exceeds_size_cap, extract_page, extract_sitemap,
    image_content_type, persist_page, resolve_image, ExtractedDocument, ExtractedPage,
    LinkTarget, PersistedPage, SiteInfo, SitemapSeeds,
};
pub use fetcher::{build_http_client, FetchResponse, Fetcher, HttpFetcher};
pub use parser::{extract_resources, PageResources};
pub use render::{HttpRenderer, RenderedPage, Renderer};
pub use scheduler::{effective_delay, Frontier, FrontierLease};

use crate::config::Config;
use crate::CrawlError;

/// Runs a complete crawl over HTTP
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Initialize the crawl database
/// 2. Seed the frontier
/// 3. Run the worker pool until the frontier goes idle
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed
/// * `Err(CrawlError)` - Crawl could not start or a worker failed
pub async fn crawl(config: &Config) -> Result<CrawlReport, CrawlError> {
    Crawler::new(config)?.run().await
}
