//! In-memory deduplication of URLs and sites for one crawl run
//!
//! Every check-and-insert goes through a single `DashMap`/`DashSet` shard
//! lock, so two workers can never both win the same URL or site.

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

/// How far a URL has progressed through the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// Pushed onto the frontier
    Queued,
    /// Popped by a worker and handed to the fetch pipeline
    Fetched,
}

/// Claimed pages and claimed sites for one crawl run
///
/// Page claims only grow; a site claim is released if its Site row was
/// never committed. A full re-crawl needs a new registry.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    pages: DashMap<String, Claim>,
    sites: DashSet<String>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL at enqueue time
    ///
    /// # Returns
    ///
    /// * `true` - The URL was unknown and the caller should push it
    /// * `false` - The URL was already queued or fetched
    pub fn offer(&self, url: &str) -> bool {
        match self.pages.entry(url.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Claim::Queued);
                true
            }
        }
    }

    /// Claims a URL for fetching at pop time
    ///
    /// Succeeds at most once per URL, whether or not it was offered first.
    ///
    /// # Returns
    ///
    /// * `true` - The caller owns the fetch of this URL
    /// * `false` - Another worker already claimed it
    pub fn claim(&self, url: &str) -> bool {
        match self.pages.entry(url.to_string()) {
            Entry::Occupied(mut slot) => {
                if *slot.get() == Claim::Fetched {
                    false
                } else {
                    slot.insert(Claim::Fetched);
                    true
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(Claim::Fetched);
                true
            }
        }
    }

    /// Claims a canonical domain; true only for the first caller
    pub fn claim_site(&self, domain: &str) -> bool {
        self.sites.insert(domain.to_string())
    }

    /// Gives back a site claim whose Site row was never committed
    ///
    /// The next page stored for the domain claims it again.
    pub fn release_site(&self, domain: &str) {
        self.sites.remove(domain);
    }

    /// Number of URLs ever seen (queued or fetched)
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }
}
