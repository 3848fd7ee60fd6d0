//! Integration tests for crawldb
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! over the reqwest-backed fetch and render collaborators.

mod crawl_tests;
mod resource_tests;

use crawldb::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use std::path::Path;

/// Creates a test configuration scoped to the mock server's host
pub fn create_test_config(seeds: Vec<String>, db_path: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 3,
            idle_timeout: 300, // Short for testing
            default_crawl_delay: 0,
            max_binary_size: 10_000_000,
            allowed_domains: vec!["127.0.0.1".to_string()],
            seeds,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().to_string(),
        },
    }
}
