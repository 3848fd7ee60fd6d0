//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::state::PageType;
use crate::storage::{CrawlStore, StorageResult};
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Total number of page rows, in any state
    pub total_pages: u64,

    /// Count of pages by type
    pub pages_by_type: HashMap<PageType, u64>,

    /// Number of registered sites
    pub sites: u64,

    /// Number of link edges
    pub links: u64,

    pub images: u64,

    /// Number of stored binary payloads
    pub binary_resources: u64,
}

impl CrawlStatistics {
    /// Count for one page type, zero if absent
    pub fn pages_of(&self, page_type: PageType) -> u64 {
        self.pages_by_type.get(&page_type).copied().unwrap_or(0)
    }

    /// Pages that reached a terminal type
    pub fn pages_fetched(&self) -> u64 {
        self.total_pages - self.pages_of(PageType::Frontier)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The crawl store to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics<S: CrawlStore + ?Sized>(store: &S) -> StorageResult<CrawlStatistics> {
    let mut pages_by_type = HashMap::new();
    for page_type in PageType::all_types() {
        let count = store.count_pages_by_type(page_type)?;
        if count > 0 {
            pages_by_type.insert(page_type, count);
        }
    }

    Ok(CrawlStatistics {
        total_pages: pages_by_type.values().sum(),
        pages_by_type,
        sites: store.count_sites()?,
        links: store.count_links()?,
        images: store.count_images()?,
        binary_resources: store.count_binary_resources()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Total pages: {}", stats.total_pages);
    println!("  Sites: {}", stats.sites);
    println!("  Links: {}", stats.links);
    println!("  Images: {}", stats.images);
    println!("  Binary payloads: {}", stats.binary_resources);
    println!();

    println!("Pages by Type:");
    for page_type in PageType::all_types() {
        let count = stats.pages_of(page_type);
        let percentage = if stats.total_pages > 0 {
            (count as f64 / stats.total_pages as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", page_type, count, percentage);
    }
    println!();

    let duplicates = stats.pages_of(PageType::Duplicate);
    let fetched_html = stats.pages_of(PageType::Html) + duplicates;
    let duplicate_rate = if fetched_html > 0 {
        (duplicates as f64 / fetched_html as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Duplicate Rate: {:.1}% ({} / {} fetched HTML pages)",
        duplicate_rate, duplicates, fetched_html
    );
}
