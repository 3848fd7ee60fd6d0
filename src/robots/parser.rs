//! Robots.txt parser implementation
//!
//! Allow/deny decisions are delegated to the robotstxt crate; crawl-delay and
//! sitemap directives, which that crate does not expose, are read here.

use robotstxt::DefaultMatcher;
use std::time::Duration;

/// Parsed robots.txt policy for one domain
#[derive(Debug, Clone)]
pub struct RobotsPolicy {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
    /// Whether to allow all (true = allow all, false = parse content)
    allow_all: bool,
}

impl RobotsPolicy {
    /// Creates a policy from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
            allow_all: false,
        }
    }

    /// Creates a permissive policy that allows everything
    ///
    /// This is used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
            allow_all: true,
        }
    }

    /// Returns the raw robots.txt content, or None for an allow-all policy
    pub fn content(&self) -> Option<&str> {
        if self.allow_all {
            None
        } else {
            Some(&self.content)
        }
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `user_agent` - The user agent token (`*` for the wildcard group)
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.allow_all || self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay for a user agent
    ///
    /// A delay declared for a group naming the agent wins over one declared
    /// for the `*` group. Consecutive `User-agent` lines form one group; the
    /// first other directive closes the agent list.
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - The declared crawl delay
    /// * `None` - If no usable crawl delay is declared
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        if self.allow_all || self.content.is_empty() {
            return None;
        }

        let normalized_agent = user_agent.to_lowercase();
        let mut group_agents: Vec<String> = Vec::new();
        let mut group_open = false;
        let mut delay_for_wildcard: Option<f64> = None;
        let mut delay_for_agent: Option<f64> = None;

        for (key, value) in directives(&self.content) {
            match key.as_str() {
                "user-agent" => {
                    if !group_open {
                        group_agents.clear();
                        group_open = true;
                    }
                    group_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    group_open = false;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    let named = group_agents
                        .iter()
                        .any(|ua| ua != "*" && normalized_agent.contains(ua.as_str()));
                    if named {
                        delay_for_agent = Some(delay);
                    } else if group_agents.iter().any(|ua| ua == "*") {
                        delay_for_wildcard = Some(delay);
                    }
                }
                _ => group_open = false,
            }
        }

        delay_for_agent
            .or(delay_for_wildcard)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Returns the `Sitemap:` URLs in declaration order
    pub fn sitemaps(&self) -> Vec<String> {
        directives(&self.content)
            .filter(|(key, value)| key == "sitemap" && !value.is_empty())
            .map(|(_, value)| value.to_string())
            .collect()
    }
}

/// Iterates `key: value` lines, with keys lowercased and comments skipped
fn directives(content: &str) -> impl Iterator<Item = (String, &str)> {
    content.lines().filter_map(|line| {
        let line = line.split('#').next().unwrap_or_default().trim();
        let (key, value) = line.split_once(':')?;
        Some((key.trim().to_lowercase(), value.trim()))
    })
}
