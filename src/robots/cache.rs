//! Per-domain robots policy cache
//!
//! Entries live for the whole crawl run. The first lookup for a domain runs
//! the fetch; concurrent lookups for the same domain wait on that fetch
//! instead of issuing their own.

use crate::robots::RobotsPolicy;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type PolicySlot = Arc<OnceCell<Arc<RobotsPolicy>>>;

/// Memoized robots policies keyed by canonical domain
#[derive(Debug, Default)]
pub struct PolicyCache {
    entries: Mutex<HashMap<String, PolicySlot>>,
}

impl PolicyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached policy for `domain`, running `init` on first use
    ///
    /// The map lock is only held to find the domain's slot, never across
    /// `init`, so a slow robots.txt fetch does not block other domains.
    pub async fn get_or_init<F, Fut>(&self, domain: &str, init: F) -> Arc<RobotsPolicy>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RobotsPolicy>,
    {
        let slot = {
            let mut entries = self.entries.lock().await;
            Arc::clone(entries.entry(domain.to_string()).or_default())
        };

        let policy = slot.get_or_init(|| async move { Arc::new(init().await) }).await;
        Arc::clone(policy)
    }

    /// Number of domains with a slot in the cache
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
