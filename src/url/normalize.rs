use crate::{UrlError, UrlResult};
use url::Url;

/// Schemes that never lead to a fetchable document
const NON_HTTP_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Parses and canonicalises an absolute URL
///
/// The URL must use `http` or `https` and carry a host. The fragment is
/// dropped so that `page#a` and `page#b` collapse onto one frontier entry;
/// everything else (scheme, `www.`, path, query) is kept as-is because it is
/// what gets fetched.
///
/// # Examples
///
/// ```
/// use crawldb::url::normalize_url;
///
/// let url = normalize_url("https://x.gov.si/about#team").unwrap();
/// assert_eq!(url.as_str(), "https://x.gov.si/about");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves an href/src attribute value found on `base` to an absolute URL
///
/// Returns None for empty references, fragment-only references, non-HTTP
/// schemes (`javascript:`, `mailto:`, `tel:`, `data:`, `ftp:` ...) and
/// anything that does not parse.
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if NON_HTTP_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return None;
    }

    let joined = base.join(href).ok()?;
    normalize_url(joined.as_str()).ok()
}
