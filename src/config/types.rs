use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for crawldb
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers pulling from the frontier
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// How long an idle worker waits on an empty frontier before the run ends (milliseconds)
    #[serde(rename = "idle-timeout", default = "default_idle_timeout")]
    pub idle_timeout: u64,

    /// Wait applied before each fetch when robots.txt gives no Crawl-delay (milliseconds)
    #[serde(rename = "default-crawl-delay", default = "default_crawl_delay")]
    pub default_crawl_delay: u64,

    /// Decoded size at or above which a binary document is not stored (bytes)
    #[serde(rename = "max-binary-size", default = "default_max_binary_size")]
    pub max_binary_size: u64,

    /// Domain allow-list (e.g. "*.gov.si" or "evem.gov.si")
    #[serde(rename = "allowed-domains", default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Start URLs for the frontier
    pub seeds: Vec<String>,
}

impl CrawlerConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout)
    }

    pub fn default_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.default_crawl_delay)
    }
}

fn default_workers() -> u32 {
    5
}

fn default_idle_timeout() -> u64 {
    60_000
}

fn default_crawl_delay() -> u64 {
    5_000
}

fn default_max_binary_size() -> u64 {
    10_000_000
}

fn default_allowed_domains() -> Vec<String> {
    vec!["*.gov.si".to_string()]
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite crawl database
    #[serde(rename = "database-path")]
    pub database_path: String,
}
