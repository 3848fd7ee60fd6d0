//! Politeness engine
//!
//! Fetches, parses and caches one robots.txt policy per domain, and seeds
//! sitemap URLs for newly registered sites. A missing or unreachable
//! robots.txt yields an allow-all policy.

mod cache;
mod parser;
mod sitemap;

pub use cache::PolicyCache;
pub use parser::RobotsPolicy;
pub use sitemap::parse_sitemap;

use crate::crawler::Fetcher;
use std::sync::Arc;
use tracing::{debug, warn};

/// The only user agent group consulted in robots.txt
pub const ROBOTS_AGENT: &str = "*";

/// Per-run robots policy source shared by all workers
pub struct PolitenessEngine {
    fetcher: Arc<dyn Fetcher>,
    cache: PolicyCache,
}

impl PolitenessEngine {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            cache: PolicyCache::new(),
        }
    }

    /// Returns the policy for a domain, fetching `{root_url}/robots.txt` on
    /// the first lookup
    ///
    /// # Arguments
    ///
    /// * `domain` - Canonical domain, the cache key
    /// * `root_url` - Scheme and authority the robots file is fetched from
    pub async fn policy_for(&self, domain: &str, root_url: &str) -> Arc<RobotsPolicy> {
        self.cache
            .get_or_init(domain, || self.fetch_policy(root_url))
            .await
    }

    async fn fetch_policy(&self, root_url: &str) -> RobotsPolicy {
        let robots_url = format!("{}/robots.txt", root_url.trim_end_matches('/'));

        match self.fetcher.get(&robots_url).await {
            Ok(response) if response.is_success() => {
                debug!("Loaded {}", robots_url);
                RobotsPolicy::from_content(&String::from_utf8_lossy(&response.body))
            }
            Ok(response) => {
                debug!(
                    "No robots.txt at {} (HTTP {}), allowing all",
                    robots_url, response.status_code
                );
                RobotsPolicy::allow_all()
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}, allowing all", robots_url, e);
                RobotsPolicy::allow_all()
            }
        }
    }

    /// Fetches the policy's first sitemap and returns the URLs it lists
    ///
    /// Returns an empty list if the policy declares no sitemap or the fetch
    /// fails. Entries are returned unfiltered.
    pub async fn sitemap_urls(&self, policy: &RobotsPolicy) -> Vec<String> {
        let Some(sitemap_url) = policy.sitemaps().into_iter().next() else {
            return Vec::new();
        };

        match self.fetcher.get(&sitemap_url).await {
            Ok(response) if response.is_success() => {
                let urls = parse_sitemap(&response.body);
                debug!("Sitemap {} lists {} URLs", sitemap_url, urls.len());
                urls
            }
            Ok(response) => {
                debug!("Sitemap {} returned HTTP {}", sitemap_url, response.status_code);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to fetch sitemap {}: {}", sitemap_url, e);
                Vec::new()
            }
        }
    }

    /// Number of domains whose policy has been requested
    pub async fn cached_domains(&self) -> usize {
        self.cache.len().await
    }
}
