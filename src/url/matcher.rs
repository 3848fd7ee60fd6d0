/// Checks if a host matches an allow-list pattern
///
/// Two pattern forms are supported:
/// 1. Exact: "evem.gov.si" matches only "evem.gov.si"
/// 2. Suffix: "*.gov.si" matches "gov.si" itself and any host ending in ".gov.si"
///
/// # Examples
///
/// ```
/// use crawldb::url::matches_wildcard;
///
/// assert!(matches_wildcard("evem.gov.si", "evem.gov.si"));
/// assert!(matches_wildcard("*.gov.si", "gov.si"));
/// assert!(matches_wildcard("*.gov.si", "www.e-prostor.gov.si"));
/// assert!(!matches_wildcard("*.gov.si", "notgov.si"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|head| head.ends_with('.'))
        }
        None => candidate == pattern,
    }
}
