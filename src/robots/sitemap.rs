use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::io::Cursor;

/// Extracts every `<loc>` URL from sitemap XML
///
/// Both `<url>` entries and nested `<sitemap>` index entries are returned,
/// in document order. Malformed XML yields whatever parsed before the error.
pub fn parse_sitemap(xml: &[u8]) -> Vec<String> {
    let mut urls = Vec::new();

    for entity in SiteMapReader::new(Cursor::new(xml)) {
        match entity {
            SiteMapEntity::Url(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    urls.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    urls.push(url.to_string());
                }
            }
            _ => {}
        }
    }

    urls
}
