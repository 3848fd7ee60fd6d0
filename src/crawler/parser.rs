//! HTML parser for extracting candidate links and images
//!
//! This module only collects raw attribute values from the DOM. Resolution,
//! scope filtering and classification happen in the extraction pipeline.

use scraper::{Html, Selector};

/// Raw references found in one HTML document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResources {
    /// `href` of every `<a>` element, in document order
    pub anchor_hrefs: Vec<String>,

    /// `src` of every `<img>` element, in document order
    pub image_srcs: Vec<String>,
}

/// Parses HTML content and collects anchor targets and image sources
///
/// # Extraction Rules
///
/// - `<a href="...">`, including `rel="nofollow"` and `download` anchors
/// - `<img src="...">`
/// - Empty or whitespace-only values are skipped; nothing else is filtered
///
/// # Example
///
/// ```
/// use crawldb::crawler::extract_resources;
///
/// let html = r#"<a href="/page">Link</a><img src="logo.png">"#;
/// let resources = extract_resources(html);
/// assert_eq!(resources.anchor_hrefs, vec!["/page"]);
/// assert_eq!(resources.image_srcs, vec!["logo.png"]);
/// ```
pub fn extract_resources(html: &str) -> PageResources {
    let document = Html::parse_document(html);

    PageResources {
        anchor_hrefs: collect_attr(&document, "a[href]", "href"),
        image_srcs: collect_attr(&document, "img[src]", "src"),
    }
}

fn collect_attr(document: &Html, selector: &str, attr: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(selector) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}
