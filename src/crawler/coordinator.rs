//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the worker pool that drives the crawl. Each worker
//! owns its whole pipeline for one URL at a time:
//! - Pop from the frontier and claim the URL
//! - Look up the domain's robots policy and wait out the crawl delay
//! - Render, seed the sitemap for new sites, extract
//! - Persist in one transaction and offer discovered URLs back to the frontier
//!
//! Per-URL failures are logged and never end the run; the run ends when the
//! frontier has been idle for the configured timeout.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::extract::{extract_page, extract_sitemap, persist_page, SiteInfo};
use crate::crawler::fetcher::{build_http_client, Fetcher, HttpFetcher};
use crate::crawler::render::{HttpRenderer, RenderedPage, Renderer};
use crate::crawler::scheduler::{effective_delay, Frontier};
use crate::robots::{PolitenessEngine, RobotsPolicy, ROBOTS_AGENT};
use crate::state::{DedupRegistry, PageType};
use crate::storage::SqliteStorage;
use crate::url::{canonical_domain, is_in_scope, normalize_url, root_url};
use crate::{CrawlError, UrlError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use url::Url;

/// Pages between progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages stored as HTML
    pub pages_html: u64,
    /// Pages stored as DUPLICATE
    pub pages_duplicate: u64,
    /// Binary payloads stored as page data
    pub binaries: u64,
    pub images: u64,
    /// URLs dropped because robots.txt disallowed them
    pub disallowed: u64,
    /// URLs dropped because rendering or the status probe failed
    pub unreachable: u64,
    /// URLs dropped because of any other error (storage, invalid URL)
    pub failed: u64,
}

impl CrawlReport {
    /// Pages stored in a terminal HTML or DUPLICATE state
    pub fn pages_stored(&self) -> u64 {
        self.pages_html + self.pages_duplicate
    }
}

#[derive(Debug, Default)]
struct CrawlCounters {
    pages_html: AtomicU64,
    pages_duplicate: AtomicU64,
    binaries: AtomicU64,
    images: AtomicU64,
    disallowed: AtomicU64,
    unreachable: AtomicU64,
    failed: AtomicU64,
}

impl CrawlCounters {
    fn snapshot(&self) -> CrawlReport {
        CrawlReport {
            pages_html: self.pages_html.load(Ordering::Relaxed),
            pages_duplicate: self.pages_duplicate.load(Ordering::Relaxed),
            binaries: self.binaries.load(Ordering::Relaxed),
            images: self.images.load(Ordering::Relaxed),
            disallowed: self.disallowed.load(Ordering::Relaxed),
            unreachable: self.unreachable.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// What happened to one popped URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Stored(PageType),
    Disallowed,
    Unreachable,
}

/// Shared state handed to every worker
pub struct CrawlContext {
    pub config: CrawlerConfig,
    pub frontier: Frontier,
    pub registry: DedupRegistry,
    pub politeness: PolitenessEngine,
    pub fetcher: Arc<dyn Fetcher>,
    pub renderer: Arc<dyn Renderer>,
    pub database_path: PathBuf,
    counters: CrawlCounters,
}

impl CrawlContext {
    /// Offers a URL to the registry and pushes it if it was unknown
    ///
    /// Returns true if the URL was pushed.
    pub async fn enqueue(&self, url: &str) -> bool {
        if self.registry.offer(url) {
            self.frontier.push(url.to_string()).await;
            true
        } else {
            false
        }
    }
}

/// Crawl run over a fixed set of collaborators
pub struct Crawler {
    ctx: Arc<CrawlContext>,
    seeds: Vec<String>,
}

impl Crawler {
    /// Creates a crawler that fetches and renders over HTTP
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to `run`
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: &Config) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent)?;
        let fetcher = Arc::new(HttpFetcher::new(client.clone()));
        let renderer = Arc::new(HttpRenderer::new(client));
        Ok(Self::with_collaborators(config, fetcher, renderer))
    }

    /// Creates a crawler over caller-supplied fetch and render collaborators
    pub fn with_collaborators(
        config: &Config,
        fetcher: Arc<dyn Fetcher>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        let ctx = CrawlContext {
            config: config.crawler.clone(),
            frontier: Frontier::new(config.crawler.idle_timeout()),
            registry: DedupRegistry::new(),
            politeness: PolitenessEngine::new(Arc::clone(&fetcher)),
            fetcher,
            renderer,
            database_path: PathBuf::from(&config.output.database_path),
            counters: CrawlCounters::default(),
        };

        Self {
            ctx: Arc::new(ctx),
            seeds: config.crawler.seeds.clone(),
        }
    }

    /// Pushes the configured seeds onto the frontier
    ///
    /// Seeds that do not parse or fall outside the allow-list are skipped.
    ///
    /// # Returns
    ///
    /// The number of seeds pushed
    pub async fn seed(&self) -> usize {
        let mut pushed = 0;
        for seed in &self.seeds {
            let url = match normalize_url(seed) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!("Skipping seed {}: {}", seed, e);
                    continue;
                }
            };
            if !is_in_scope(&url, &self.ctx.config.allowed_domains) {
                tracing::warn!("Skipping seed {}: outside allowed domains", seed);
                continue;
            }
            if self.ctx.enqueue(url.as_str()).await {
                pushed += 1;
            }
        }
        pushed
    }

    /// Runs the crawl until the frontier goes idle
    ///
    /// Initializes the database schema, seeds the frontier and spawns the
    /// worker pool. Each worker opens its own database connection.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The frontier went idle
    /// * `Err(CrawlError)` - The database could not be opened or a worker panicked
    pub async fn run(&self) -> Result<CrawlReport, CrawlError> {
        SqliteStorage::new(&self.ctx.database_path)?;

        let seeded = self.seed().await;
        tracing::info!(
            "Starting crawl with {} workers and {} seeds",
            self.ctx.config.workers,
            seeded
        );

        let handles: Vec<_> = (0..self.ctx.config.workers)
            .map(|worker_id| tokio::spawn(worker_loop(Arc::clone(&self.ctx), worker_id)))
            .collect();

        let mut first_error = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!("Worker stopped: {}", e);
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    first_error.get_or_insert(CrawlError::Worker(e.to_string()));
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        let report = self.ctx.counters.snapshot();
        tracing::info!(
            "Crawl complete: {} HTML, {} duplicate, {} binaries, {} images, {} disallowed, {} unreachable, {} failed",
            report.pages_html,
            report.pages_duplicate,
            report.binaries,
            report.images,
            report.disallowed,
            report.unreachable,
            report.failed
        );
        tracing::info!(
            "{} sites registered, robots.txt consulted for {} domains",
            self.ctx.registry.site_count(),
            self.ctx.politeness.cached_domains().await
        );
        Ok(report)
    }

    /// Shared context, for inspection after a run
    pub fn context(&self) -> &CrawlContext {
        &self.ctx
    }
}

async fn worker_loop(ctx: Arc<CrawlContext>, worker_id: u32) -> Result<(), CrawlError> {
    let mut storage = SqliteStorage::new(&ctx.database_path)?;
    tracing::debug!("Worker {} started", worker_id);

    while let Some(lease) = ctx.frontier.pop().await {
        let url = lease.url().to_string();

        if !ctx.registry.claim(&url) {
            tracing::trace!("Worker {} skipping already claimed {}", worker_id, url);
            continue;
        }

        match process_url(&ctx, &mut storage, &url).await {
            Ok(Outcome::Stored(page_type)) => {
                let counter = match page_type {
                    PageType::Duplicate => &ctx.counters.pages_duplicate,
                    _ => &ctx.counters.pages_html,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                log_progress(&ctx).await;
            }
            Ok(Outcome::Disallowed) => {
                ctx.counters.disallowed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Outcome::Unreachable) => {
                ctx.counters.unreachable.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!("Worker {} failed on {}: {}", worker_id, url, e);
                ctx.counters.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    tracing::debug!("Worker {} finished", worker_id);
    Ok(())
}

async fn log_progress(ctx: &CrawlContext) {
    let report = ctx.counters.snapshot();
    let stored = report.pages_stored();
    if stored % PROGRESS_INTERVAL == 0 {
        tracing::info!(
            "Progress: {} pages stored ({} duplicates), {} queued, {} in flight, {} URLs seen",
            stored,
            report.pages_duplicate,
            ctx.frontier.len().await,
            ctx.frontier.active(),
            ctx.registry.page_count()
        );
    }
}

async fn process_url(
    ctx: &CrawlContext,
    storage: &mut SqliteStorage,
    url_str: &str,
) -> Result<Outcome, CrawlError> {
    let url = normalize_url(url_str)?;
    let domain = canonical_domain(&url).ok_or(UrlError::MissingDomain)?;
    let policy = ctx.politeness.policy_for(&domain, &root_url(&url)).await;

    if !policy.is_allowed(url.as_str(), ROBOTS_AGENT) {
        tracing::debug!("URL {} disallowed by robots.txt", url);
        return Ok(Outcome::Disallowed);
    }

    let delay = effective_delay(&policy, ctx.config.default_crawl_delay());
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    tracing::debug!("Rendering {}", url);
    let rendered = match ctx.renderer.render(&url).await {
        Ok(rendered) => rendered,
        Err(e) => {
            tracing::warn!("{}", e);
            return Ok(Outcome::Unreachable);
        }
    };

    let claimed_site = ctx.registry.claim_site(&domain);
    let outcome = store_page(
        ctx,
        storage,
        &url,
        domain.clone(),
        &policy,
        rendered,
        claimed_site,
    )
    .await;

    // The Site row only exists once a page of the domain has been committed
    if claimed_site && !matches!(outcome, Ok(Outcome::Stored(_))) {
        tracing::debug!("Releasing site claim for {}", domain);
        ctx.registry.release_site(&domain);
    }
    outcome
}

async fn store_page(
    ctx: &CrawlContext,
    storage: &mut SqliteStorage,
    url: &Url,
    domain: String,
    policy: &RobotsPolicy,
    rendered: RenderedPage,
    seed_sitemap: bool,
) -> Result<Outcome, CrawlError> {
    let sitemap = if seed_sitemap {
        extract_sitemap(ctx, url, policy).await
    } else {
        Default::default()
    };

    let Some(mut page) = extract_page(ctx, url, rendered, policy).await else {
        return Ok(Outcome::Unreachable);
    };
    page.sitemap_links = sitemap.pages;
    page.sitemap_documents = sitemap.documents;

    let sitemaps = policy.sitemaps();
    let site = SiteInfo {
        domain,
        robots_content: policy.content().map(str::to_string),
        sitemap_content: (!sitemaps.is_empty()).then(|| sitemaps.join("\n")),
    };

    let persisted = {
        let tx = storage.transaction()?;
        let persisted = persist_page(&*tx, &site, &page)?;
        tx.commit()?;
        persisted
    };

    ctx.counters
        .binaries
        .fetch_add(persisted.binaries_stored as u64, Ordering::Relaxed);
    ctx.counters
        .images
        .fetch_add(persisted.images_stored as u64, Ordering::Relaxed);

    let mut pushed = 0;
    for link in &persisted.discovered {
        if ctx.enqueue(link).await {
            pushed += 1;
        }
    }

    tracing::debug!(
        "Stored {} as {} ({} new URLs queued)",
        url,
        persisted.page_type,
        pushed
    );
    Ok(Outcome::Stored(persisted.page_type))
}
