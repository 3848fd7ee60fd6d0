//! Output module for reporting on a crawl database
//!
//! This module handles:
//! - Counting pages per type and the rows that hang off them
//! - Printing those counts for the `--stats` mode

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
