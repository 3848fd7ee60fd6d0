//! Frontier scheduler
//!
//! This module handles:
//! - The FIFO queue of discovered URLs (breadth-first by discovery order)
//! - Idle-timeout popping, the only way a crawl run ends
//! - Lease accounting, so the run cannot end while a worker may still push
//! - The per-fetch crawl-delay budget

use crate::robots::{RobotsPolicy, ROBOTS_AGENT};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// Shared FIFO work queue for all workers
///
/// A URL popped from the frontier is handed out as a `FrontierLease`. While
/// any lease is alive, its holder may still push new URLs, so `pop` on an
/// empty queue keeps waiting instead of ending the run.
pub struct Frontier {
    queue: Mutex<VecDeque<String>>,
    /// Number of leases not yet dropped
    active: AtomicUsize,
    notify: Notify,
    idle_timeout: Duration,
}

/// A URL checked out of the frontier
///
/// Dropping the lease tells the frontier this worker is done with it.
#[derive(Debug)]
pub struct FrontierLease<'a> {
    frontier: &'a Frontier,
    url: String,
}

impl FrontierLease<'_> {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for FrontierLease<'_> {
    fn drop(&mut self) {
        self.frontier.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Frontier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frontier")
            .field("active", &self.active.load(Ordering::SeqCst))
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `idle_timeout` - How long `pop` waits on an empty queue before
    ///   checking whether the run is over
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            active: AtomicUsize::new(0),
            notify: Notify::new(),
            idle_timeout,
        }
    }

    /// Appends a URL to the back of the queue and wakes one waiting worker
    pub async fn push(&self, url: String) {
        self.queue.lock().await.push_back(url);
        self.notify.notify_one();
        tracing::trace!("Frontier push");
    }

    /// Takes the URL at the front of the queue
    ///
    /// Blocks while the queue is empty. Each time the idle timeout elapses
    /// without a push, the frontier checks whether any lease is still
    /// outstanding.
    ///
    /// # Returns
    ///
    /// * `Some(lease)` - The next URL to process
    /// * `None` - The queue is empty, no lease is outstanding and nothing
    ///   was pushed for a full idle timeout
    pub async fn pop(&self) -> Option<FrontierLease<'_>> {
        loop {
            let notified = self.notify.notified();

            {
                let mut queue = self.queue.lock().await;
                if let Some(url) = queue.pop_front() {
                    self.active.fetch_add(1, Ordering::SeqCst);
                    return Some(FrontierLease {
                        frontier: self,
                        url,
                    });
                }
            }

            if tokio::time::timeout(self.idle_timeout, notified).await.is_err() {
                let queue = self.queue.lock().await;
                if queue.is_empty() && self.active.load(Ordering::SeqCst) == 0 {
                    tracing::debug!("Frontier idle for {:?}, stopping", self.idle_timeout);
                    return None;
                }
            }
        }
    }

    /// Number of queued URLs
    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of leases currently checked out
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Calculates the wait applied before fetching from a domain
///
/// The robots.txt crawl delay for the wildcard agent, or `default` when the
/// policy declares none. The wait is applied by the fetching worker only;
/// it is not a rate limit shared across workers.
pub fn effective_delay(policy: &RobotsPolicy, default: Duration) -> Duration {
    policy.crawl_delay(ROBOTS_AGENT).unwrap_or(default)
}
