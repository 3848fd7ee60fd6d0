//! Extraction and classification pipeline
//!
//! Turns one rendered page into the rows it contributes to the crawl graph:
//! the page itself (HTML or DUPLICATE), FRONTIER pages and links for
//! in-scope anchors, BINARY pages and payloads for documents, and images.
//! Network work happens in `extract_page`; all writes happen in
//! `persist_page`, which is synchronous so it can run inside one transaction.

use crate::crawler::coordinator::CrawlContext;
use crate::crawler::render::RenderedPage;
use crate::robots::{RobotsPolicy, ROBOTS_AGENT};
use crate::state::{ContentHash, DataType, PageType};
use crate::storage::{CrawlStore, ImageRecord, PageTransition, StorageError, StorageResult};
use crate::url::{canonical_domain, is_in_scope, resolve_href, root_url};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use url::Url;

/// Where an anchor leads, after resolution and scope filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Non-HTTP, fragment-only, unparseable or out of scope
    Rejected,
    /// An HTML page candidate for the frontier
    Page(Url),
    /// A binary document fetched directly
    Document(Url, DataType),
}

/// Domain and robots data for the site a page belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub domain: String,
    pub robots_content: Option<String>,
    /// Newline-joined `Sitemap:` URLs
    pub sitemap_content: Option<String>,
}

/// A binary document discovered and fetched from a page
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub url: Url,
    pub data_type: DataType,
    pub status_code: u16,
    /// Base64 payload; None when it was at or above the size cap
    pub payload: Option<String>,
    pub accessed_at: DateTime<Utc>,
}

/// Everything one page contributes to the crawl graph
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    /// URL the page is stored under (the URL taken from the frontier)
    pub url: String,
    pub status_code: u16,
    pub html: String,
    pub hash: ContentHash,
    pub accessed_at: DateTime<Utc>,
    /// In-scope, allowed page links in discovery order, without repeats
    pub links: Vec<Url>,
    /// Documents this worker claimed and fetched
    pub documents: Vec<ExtractedDocument>,
    /// Documents claimed by another page; only linked if already stored
    pub document_refs: Vec<Url>,
    pub images: Vec<ImageRecord>,
    /// URLs seeded from the site's sitemap; stored as FRONTIER pages without links
    pub sitemap_links: Vec<Url>,
    /// Documents seeded from the site's sitemap; stored as BINARY pages without links
    pub sitemap_documents: Vec<ExtractedDocument>,
}

/// What a newly registered site's sitemap contributes
#[derive(Debug, Clone, Default)]
pub struct SitemapSeeds {
    pub pages: Vec<Url>,
    pub documents: Vec<ExtractedDocument>,
}

/// Outcome of persisting one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPage {
    pub page_id: i64,
    pub page_type: PageType,
    /// Page URLs to offer to the frontier
    pub discovered: Vec<String>,
    pub binaries_stored: usize,
    pub images_stored: usize,
}

/// Computes the content hash of a page's raw HTML
pub fn content_hash(html: &str) -> ContentHash {
    ContentHash::of(html.as_bytes())
}

/// Resolves and classifies one anchor `href` found on `base`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use crawldb::crawler::{classify_link, LinkTarget};
///
/// let base = Url::parse("https://x.gov.si/home").unwrap();
/// let allow = vec!["*.gov.si".to_string()];
///
/// assert_eq!(
///     classify_link("/about", &base, &allow),
///     LinkTarget::Page(Url::parse("https://x.gov.si/about").unwrap())
/// );
/// assert_eq!(classify_link("https://example.com/", &base, &allow), LinkTarget::Rejected);
/// ```
pub fn classify_link(href: &str, base: &Url, allowed_domains: &[String]) -> LinkTarget {
    let Some(url) = resolve_href(href, base) else {
        return LinkTarget::Rejected;
    };

    if !is_in_scope(&url, allowed_domains) {
        return LinkTarget::Rejected;
    }

    match DataType::from_url(&url) {
        Some(data_type) => LinkTarget::Document(url, data_type),
        None => LinkTarget::Page(url),
    }
}

/// Resolves an image `src` found on `base`; images are not scope-filtered
pub fn resolve_image(src: &str, base: &Url) -> Option<Url> {
    resolve_href(src, base)
}

/// Returns true if base64 `encoded` decodes to `cap` bytes or more
///
/// The decoded length is computed from the encoded length and padding, so
/// the payload is never decoded.
pub fn exceeds_size_cap(encoded: &str, cap: u64) -> bool {
    let padding = encoded.bytes().rev().take(2).filter(|b| *b == b'=').count();
    let decoded = (encoded.len() / 4 * 3).saturating_sub(padding);
    decoded as u64 >= cap
}

/// Fetches what a rendered page references and assembles its graph rows
///
/// Nothing is written here. Failures of individual documents and images
/// are logged and skipped.
///
/// # Returns
///
/// * `Some(ExtractedPage)` - The page and every resource that succeeded
/// * `None` - The status probe failed; the page is dropped
pub async fn extract_page(
    ctx: &CrawlContext,
    url: &Url,
    rendered: RenderedPage,
    policy: &RobotsPolicy,
) -> Option<ExtractedPage> {
    let status_code = match rendered.status_code {
        Some(status) => status,
        None => match ctx.fetcher.get(url.as_str()).await {
            Ok(response) => response.status_code,
            Err(e) => {
                tracing::warn!("Status probe failed for {}: {}", url, e);
                return None;
            }
        },
    };

    let accessed_at = Utc::now();
    let hash = content_hash(&rendered.html);
    let page_domain = canonical_domain(url);
    let base = &rendered.final_url;
    let allowed = &ctx.config.allowed_domains;

    let mut links = Vec::new();
    let mut seen_links = HashSet::new();
    let mut documents = Vec::new();
    let mut document_refs = Vec::new();

    for href in &rendered.anchor_hrefs {
        match classify_link(href, base, allowed) {
            LinkTarget::Rejected => {}
            LinkTarget::Page(link) => {
                if !seen_links.insert(link.clone()) {
                    continue;
                }
                if !link_allowed(ctx, page_domain.as_deref(), policy, &link).await {
                    tracing::debug!("Link {} disallowed by robots.txt", link);
                    continue;
                }
                links.push(link);
            }
            LinkTarget::Document(link, data_type) => {
                if !seen_links.insert(link.clone()) {
                    continue;
                }
                if !link_allowed(ctx, page_domain.as_deref(), policy, &link).await {
                    tracing::debug!("Document {} disallowed by robots.txt", link);
                    continue;
                }
                if !ctx.registry.claim(link.as_str()) {
                    document_refs.push(link);
                    continue;
                }
                if let Some(document) = fetch_document(ctx, link, data_type).await {
                    documents.push(document);
                }
            }
        }
    }

    let mut images = Vec::new();
    let mut seen_images = HashSet::new();

    for src in &rendered.image_srcs {
        let Some(image_url) = resolve_image(src, base) else {
            continue;
        };
        if !seen_images.insert(image_url.clone()) {
            continue;
        }
        if let Some(image) = fetch_image(ctx, &image_url).await {
            images.push(image);
        }
    }

    tracing::debug!(
        "Extracted {}: {} links, {} documents, {} images",
        url,
        links.len(),
        documents.len(),
        images.len()
    );

    Some(ExtractedPage {
        url: url.to_string(),
        status_code,
        html: rendered.html,
        hash,
        accessed_at,
        links,
        documents,
        document_refs,
        images,
        sitemap_links: Vec::new(),
        sitemap_documents: Vec::new(),
    })
}

/// Checks a discovered URL against the robots policy of its own domain
///
/// The page's policy is reused for same-domain links; any other domain's
/// policy comes from the politeness cache, fetching its robots.txt on first use.
async fn link_allowed(
    ctx: &CrawlContext,
    page_domain: Option<&str>,
    page_policy: &RobotsPolicy,
    link: &Url,
) -> bool {
    let Some(domain) = canonical_domain(link) else {
        return false;
    };

    if page_domain == Some(domain.as_str()) {
        return page_policy.is_allowed(link.as_str(), ROBOTS_AGENT);
    }

    ctx.politeness
        .policy_for(&domain, &root_url(link))
        .await
        .is_allowed(link.as_str(), ROBOTS_AGENT)
}

/// Fetches the first sitemap of a newly registered site and classifies its entries
///
/// Entries go through the same scope, robots and document rules as anchors
/// found on `page_url`. Documents are claimed and fetched here.
pub async fn extract_sitemap(
    ctx: &CrawlContext,
    page_url: &Url,
    policy: &RobotsPolicy,
) -> SitemapSeeds {
    let page_domain = canonical_domain(page_url);
    let mut seeds = SitemapSeeds::default();
    let mut seen = HashSet::new();

    for entry in ctx.politeness.sitemap_urls(policy).await {
        match classify_link(&entry, page_url, &ctx.config.allowed_domains) {
            LinkTarget::Rejected => {}
            LinkTarget::Page(link) => {
                if seen.insert(link.clone())
                    && link_allowed(ctx, page_domain.as_deref(), policy, &link).await
                {
                    seeds.pages.push(link);
                }
            }
            LinkTarget::Document(link, data_type) => {
                if !seen.insert(link.clone())
                    || !link_allowed(ctx, page_domain.as_deref(), policy, &link).await
                    || !ctx.registry.claim(link.as_str())
                {
                    continue;
                }
                if let Some(document) = fetch_document(ctx, link, data_type).await {
                    seeds.documents.push(document);
                }
            }
        }
    }

    if !seeds.pages.is_empty() || !seeds.documents.is_empty() {
        tracing::info!(
            "Seeding {} pages and {} documents from the sitemap of {}",
            seeds.pages.len(),
            seeds.documents.len(),
            page_domain.as_deref().unwrap_or_default()
        );
    }
    seeds
}

async fn fetch_document(
    ctx: &CrawlContext,
    url: Url,
    data_type: DataType,
) -> Option<ExtractedDocument> {
    let response = match ctx.fetcher.get(url.as_str()).await {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            tracing::warn!("Document {} returned HTTP {}", url, response.status_code);
            return None;
        }
        Err(e) => {
            tracing::warn!("Failed to fetch document {}: {}", url, e);
            return None;
        }
    };

    let encoded = STANDARD.encode(&response.body);
    let payload = if exceeds_size_cap(&encoded, ctx.config.max_binary_size) {
        tracing::info!(
            "Document {} is {} bytes, not storing payload",
            url,
            response.body.len()
        );
        None
    } else {
        Some(encoded)
    };

    Some(ExtractedDocument {
        url,
        data_type,
        status_code: response.status_code,
        payload,
        accessed_at: Utc::now(),
    })
}

async fn fetch_image(ctx: &CrawlContext, url: &Url) -> Option<ImageRecord> {
    let response = match ctx.fetcher.get(url.as_str()).await {
        Ok(response) if response.is_success() => response,
        Ok(response) => {
            tracing::debug!("Image {} returned HTTP {}", url, response.status_code);
            return None;
        }
        Err(e) => {
            tracing::warn!("Failed to fetch image {}: {}", url, e);
            return None;
        }
    };

    let filename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("image")
        .to_string();

    let content_type = image_content_type(response.content_type.as_deref(), url);

    Some(ImageRecord {
        filename,
        content_type,
        data: STANDARD.encode(&response.body),
        accessed_at: Utc::now(),
    })
}

/// Picks an image's content type
///
/// A specific `Content-Type` header wins. An empty or
/// `application/octet-stream` header counts as missing, and the type is
/// guessed from the URL's extension instead.
pub fn image_content_type(header: Option<&str>, url: &Url) -> Option<String> {
    let header = header.map(str::trim).filter(|value| !value.is_empty());
    let essence = header
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .unwrap_or_default();

    if let Some(value) = header {
        if !essence.is_empty() && !essence.eq_ignore_ascii_case("application/octet-stream") {
            return Some(value.to_string());
        }
    }

    mime_guess::from_path(url.path())
        .first_raw()
        .map(str::to_string)
        .or_else(|| header.map(str::to_string))
}

/// Writes one extracted page and everything it references
///
/// Call this inside a transaction: the site lookup, hash check and page
/// transition are check-then-act sequences.
///
/// The page becomes DUPLICATE when an HTML page with the same hash already
/// exists, and HTML otherwise; only HTML pages keep their content.
pub fn persist_page<S: CrawlStore + ?Sized>(
    store: &S,
    site: &SiteInfo,
    page: &ExtractedPage,
) -> StorageResult<PersistedPage> {
    let site_id = store.upsert_site(
        &site.domain,
        site.robots_content.as_deref(),
        site.sitemap_content.as_deref(),
    )?;

    let page_type = if store.hash_exists(&page.hash)? {
        PageType::Duplicate
    } else {
        PageType::Html
    };

    let page_id = store.transition_page(
        &page.url,
        Some(site_id),
        &PageTransition {
            page_type,
            hash: Some(page.hash),
            html_content: (page_type == PageType::Html).then_some(page.html.as_str()),
            http_status_code: Some(page.status_code),
            accessed_at: page.accessed_at,
        },
    )?;

    let mut discovered = Vec::with_capacity(page.links.len() + page.sitemap_links.len());

    for link in &page.links {
        let to_page = create_frontier_page(store, link)?;
        store.create_link(page_id, to_page)?;
        discovered.push(link.to_string());
    }

    for link in &page.sitemap_links {
        create_frontier_page(store, link)?;
        discovered.push(link.to_string());
    }

    let mut binaries_stored = 0;
    for document in &page.documents {
        if persist_document(store, site_id, Some(page_id), document)? {
            binaries_stored += 1;
        }
    }

    for document in &page.sitemap_documents {
        if persist_document(store, site_id, None, document)? {
            binaries_stored += 1;
        }
    }

    for url in &page.document_refs {
        link_existing(store, page_id, url)?;
    }

    for image in &page.images {
        store.create_image(page_id, image)?;
    }

    Ok(PersistedPage {
        page_id,
        page_type,
        discovered,
        binaries_stored,
        images_stored: page.images.len(),
    })
}

/// Stores a document as a BINARY page, linked from `referrer` if given
///
/// Returns true if its payload was stored. A document that is already
/// terminal only gets the link.
fn persist_document<S: CrawlStore + ?Sized>(
    store: &S,
    site_id: i64,
    referrer: Option<i64>,
    document: &ExtractedDocument,
) -> StorageResult<bool> {
    let transition = PageTransition {
        page_type: PageType::Binary,
        hash: None,
        html_content: None,
        http_status_code: Some(document.status_code),
        accessed_at: document.accessed_at,
    };

    match store.transition_page(document.url.as_str(), Some(site_id), &transition) {
        Ok(document_id) => {
            if let Some(from_page) = referrer {
                store.create_link(from_page, document_id)?;
            }
            match &document.payload {
                Some(payload) => {
                    store.create_binary_resource(document_id, document.data_type, payload)?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        Err(StorageError::InvalidTransition { .. }) => {
            if let Some(from_page) = referrer {
                link_existing(store, from_page, &document.url)?;
            }
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

fn create_frontier_page<S: CrawlStore + ?Sized>(store: &S, url: &Url) -> StorageResult<i64> {
    let site_id = match canonical_domain(url) {
        Some(domain) => store.site_by_domain(&domain)?.map(|site| site.id),
        None => None,
    };
    let (page_id, _) = store.create_page_frontier(url.as_str(), site_id)?;
    Ok(page_id)
}

fn link_existing<S: CrawlStore + ?Sized>(store: &S, from_page: i64, url: &Url) -> StorageResult<()> {
    if let Some(existing) = store.page_by_url(url.as_str())? {
        store.create_link(from_page, existing.id)?;
    }
    Ok(())
}
