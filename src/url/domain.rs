use url::Url;

/// Extracts the canonical domain of a URL
///
/// The canonical domain is the lowercase host with any leading `www.`
/// removed; scheme, port and path are dropped. It is the key for Site rows
/// and for the per-domain politeness cache.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use crawldb::url::canonical_domain;
///
/// let url = Url::parse("http://www.E-Prostor.gov.si/nc/").unwrap();
/// assert_eq!(canonical_domain(&url), Some("e-prostor.gov.si".to_string()));
/// ```
pub fn canonical_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => Some(rest.to_string()),
        _ => Some(host),
    }
}

/// Returns the scheme and authority of a URL, e.g. `https://x.gov.si:8443`
///
/// This is the root against which `robots.txt` is fetched.
pub fn root_url(url: &Url) -> String {
    url.origin().ascii_serialization()
}
