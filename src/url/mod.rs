//! URL handling module for crawldb
//!
//! This module provides URL canonicalisation, reference resolution, domain
//! extraction and the allow-list scope check that every discovered URL
//! passes before it can reach the frontier.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::{canonical_domain, root_url};
pub use matcher::matches_wildcard;
pub use normalize::{normalize_url, resolve_href};

use url::Url;

/// Returns true if the URL's host matches any allow-list pattern
///
/// Only the host takes part in the check; scheme and port are ignored.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use crawldb::url::is_in_scope;
///
/// let allow = vec!["*.gov.si".to_string()];
/// assert!(is_in_scope(&Url::parse("https://evem.gov.si/").unwrap(), &allow));
/// assert!(!is_in_scope(&Url::parse("https://example.com/").unwrap(), &allow));
/// ```
pub fn is_in_scope(url: &Url, allowed_domains: &[String]) -> bool {
    let host = match url.host_str() {
        Some(host) => host.to_lowercase(),
        None => return false,
    };

    allowed_domains
        .iter()
        .any(|pattern| matches_wildcard(&pattern.to_lowercase(), &host))
}
