//! SQLite storage implementation
//!
//! `CrawlStore` is implemented directly on `rusqlite::Connection`.
//! `SqliteStorage` owns one connection per worker and hands out immediate
//! transactions for page-level atomic writes.

use crate::state::{ContentHash, DataType, PageType};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CrawlStore, StorageError, StorageResult};
use crate::storage::{ImageRecord, PageRecord, PageTransition, SiteRecord};
use crate::CrawlError;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the crawl database at `path`
    ///
    /// Each worker opens its own `SqliteStorage`; WAL mode plus a busy
    /// timeout lets them write to one file concurrently.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(CrawlError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, CrawlError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, CrawlError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Borrows the underlying connection for single-statement reads
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Starts a `BEGIN IMMEDIATE` transaction
    ///
    /// The write lock is taken up front, so check-then-act sequences inside
    /// the transaction (hash lookup, site registration) are serialised
    /// against every other worker.
    pub fn transaction(&mut self) -> StorageResult<Transaction<'_>> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }
}

fn page_type_column(code: &str, index: usize) -> rusqlite::Result<PageType> {
    PageType::from_db_string(code)
        .ok_or_else(|| rusqlite::Error::InvalidColumnType(index, code.to_string(), Type::Text))
}

impl CrawlStore for Connection {
    // ===== Site Management =====

    fn upsert_site(
        &self,
        domain: &str,
        robots_content: Option<&str>,
        sitemap_content: Option<&str>,
    ) -> StorageResult<i64> {
        self.execute(
            "INSERT OR IGNORE INTO site (domain, robots_content, sitemap_content) VALUES (?1, ?2, ?3)",
            params![domain, robots_content, sitemap_content],
        )?;

        let id = self.query_row(
            "SELECT id FROM site WHERE domain = ?1",
            params![domain],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn site_by_domain(&self, domain: &str) -> StorageResult<Option<SiteRecord>> {
        let site = self
            .query_row(
                "SELECT id, domain, robots_content, sitemap_content FROM site WHERE domain = ?1",
                params![domain],
                |row| {
                    Ok(SiteRecord {
                        id: row.get(0)?,
                        domain: row.get(1)?,
                        robots_content: row.get(2)?,
                        sitemap_content: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(site)
    }

    // ===== Page Management =====

    fn create_page_frontier(&self, url: &str, site_id: Option<i64>) -> StorageResult<(i64, bool)> {
        let inserted = self.execute(
            "INSERT OR IGNORE INTO page (site_id, page_type_code, url) VALUES (?1, ?2, ?3)",
            params![site_id, PageType::Frontier.to_db_string(), url],
        )?;

        let id = self.query_row("SELECT id FROM page WHERE url = ?1", params![url], |row| {
            row.get(0)
        })?;
        Ok((id, inserted > 0))
    }

    fn transition_page(
        &self,
        url: &str,
        site_id: Option<i64>,
        transition: &PageTransition<'_>,
    ) -> StorageResult<i64> {
        let to = transition.page_type;
        let current = self
            .query_row(
                "SELECT id, page_type_code FROM page WHERE url = ?1",
                params![url],
                |row| Ok((row.get::<_, i64>(0)?, page_type_column(&row.get::<_, String>(1)?, 1)?)),
            )
            .optional()?;

        let from = current.map_or(PageType::Frontier, |(_, page_type)| page_type);
        if from.is_terminal() || !to.is_terminal() {
            return Err(StorageError::InvalidTransition {
                url: url.to_string(),
                from,
                to,
            });
        }

        let hash = transition.hash.as_ref().map(ContentHash::as_bytes);
        let accessed_time = transition.accessed_at.to_rfc3339();

        match current {
            Some((id, _)) => {
                self.execute(
                    "UPDATE page SET page_type_code = ?1, hash = ?2, html_content = ?3,
                     http_status_code = ?4, accessed_time = ?5, site_id = COALESCE(site_id, ?6)
                     WHERE id = ?7",
                    params![
                        to.to_db_string(),
                        hash,
                        transition.html_content,
                        transition.http_status_code,
                        accessed_time,
                        site_id,
                        id
                    ],
                )?;
                Ok(id)
            }
            None => {
                self.execute(
                    "INSERT INTO page (site_id, page_type_code, url, html_content, http_status_code,
                     accessed_time, hash) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        site_id,
                        to.to_db_string(),
                        url,
                        transition.html_content,
                        transition.http_status_code,
                        accessed_time,
                        hash
                    ],
                )?;
                Ok(self.last_insert_rowid())
            }
        }
    }

    fn page_exists(&self, url: &str) -> StorageResult<bool> {
        let exists = self.query_row(
            "SELECT EXISTS(SELECT 1 FROM page WHERE url = ?1)",
            params![url],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn hash_exists(&self, hash: &ContentHash) -> StorageResult<bool> {
        let exists = self.query_row(
            "SELECT EXISTS(SELECT 1 FROM page WHERE hash = ?1 AND page_type_code = ?2)",
            params![hash.as_bytes(), PageType::Html.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>> {
        let page = self
            .query_row(
                "SELECT id, site_id, url, page_type_code, html_content, http_status_code,
                 accessed_time, hash FROM page WHERE url = ?1",
                params![url],
                |row| {
                    let hash: Option<Vec<u8>> = row.get(7)?;
                    Ok(PageRecord {
                        id: row.get(0)?,
                        site_id: row.get(1)?,
                        url: row.get(2)?,
                        page_type: page_type_column(&row.get::<_, String>(3)?, 3)?,
                        html_content: row.get(4)?,
                        http_status_code: row.get(5)?,
                        accessed_time: row.get(6)?,
                        hash: hash.as_deref().and_then(ContentHash::from_slice),
                    })
                },
            )
            .optional()?;
        Ok(page)
    }

    // ===== Link and Resource Management =====

    fn create_link(&self, from_page_id: i64, to_page_id: i64) -> StorageResult<bool> {
        let inserted = self.execute(
            "INSERT OR IGNORE INTO link (from_page, to_page) VALUES (?1, ?2)",
            params![from_page_id, to_page_id],
        )?;
        Ok(inserted > 0)
    }

    fn create_image(&self, page_id: i64, image: &ImageRecord) -> StorageResult<i64> {
        self.execute(
            "INSERT INTO image (page_id, filename, content_type, data, accessed_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                page_id,
                image.filename,
                image.content_type,
                image.data,
                image.accessed_at.to_rfc3339()
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn create_binary_resource(
        &self,
        page_id: i64,
        data_type: DataType,
        data: &str,
    ) -> StorageResult<i64> {
        self.execute(
            "INSERT INTO page_data (page_id, data_type_code, data) VALUES (?1, ?2, ?3)",
            params![page_id, data_type.to_db_string(), data],
        )?;
        Ok(self.last_insert_rowid())
    }

    // ===== Statistics =====

    fn count_pages_by_type(&self, page_type: PageType) -> StorageResult<u64> {
        let count: i64 = self.query_row(
            "SELECT COUNT(*) FROM page WHERE page_type_code = ?1",
            params![page_type.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_sites(&self) -> StorageResult<u64> {
        let count: i64 = self.query_row("SELECT COUNT(*) FROM site", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_links(&self) -> StorageResult<u64> {
        let count: i64 = self.query_row("SELECT COUNT(*) FROM link", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_images(&self) -> StorageResult<u64> {
        let count: i64 = self.query_row("SELECT COUNT(*) FROM image", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_binary_resources(&self) -> StorageResult<u64> {
        let count: i64 = self.query_row("SELECT COUNT(*) FROM page_data", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::{Arc, Barrier};

    fn html(content: &str) -> PageTransition<'_> {
        PageTransition {
            page_type: PageType::Html,
            hash: Some(ContentHash::of(content.as_bytes())),
            html_content: Some(content),
            http_status_code: Some(200),
            accessed_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_upsert_site_first_wins() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let store = storage.conn();

        let id1 = store
            .upsert_site("a.gov.si", Some("User-agent: *"), None)
            .unwrap();
        let id2 = store.upsert_site("a.gov.si", None, Some("x")).unwrap();
        assert_eq!(id1, id2);

        let site = store.site_by_domain("a.gov.si").unwrap().unwrap();
        assert_eq!(site.robots_content.as_deref(), Some("User-agent: *"));
        assert_eq!(site.sitemap_content, None);
        assert!(store.site_by_domain("b.gov.si").unwrap().is_none());
    }

    #[test]
    fn test_create_page_frontier_once() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let store = storage.conn();

        let (id1, created1) = store.create_page_frontier("https://a.gov.si/", None).unwrap();
        let (id2, created2) = store.create_page_frontier("https://a.gov.si/", None).unwrap();

        assert_eq!(id1, id2);
        assert!(created1);
        assert!(!created2);

        let page = store.page_by_url("https://a.gov.si/").unwrap().unwrap();
        assert_eq!(page.page_type, PageType::Frontier);
        assert!(page.hash.is_none());
    }

    #[test]
    fn test_transition_frontier_to_html() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let store = storage.conn();
        let site_id = store.upsert_site("a.gov.si", None, None).unwrap();

        let (frontier_id, _) = store.create_page_frontier("https://a.gov.si/", None).unwrap();
        let id = store
            .transition_page("https://a.gov.si/", Some(site_id), &html("<p>hi</p>"))
            .unwrap();
        assert_eq!(id, frontier_id);

        let page = store.page_by_url("https://a.gov.si/").unwrap().unwrap();
        assert_eq!(page.page_type, PageType::Html);
        assert_eq!(page.site_id, Some(site_id));
        assert_eq!(page.html_content.as_deref(), Some("<p>hi</p>"));
        assert_eq!(page.http_status_code, Some(200));
        assert_eq!(page.hash, Some(ContentHash::of(b"<p>hi</p>")));
        assert!(page.accessed_time.is_some());
    }

    #[test]
    fn test_transition_creates_missing_row() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let store = storage.conn();

        let id = store
            .transition_page("https://a.gov.si/seed", None, &html("<p>seed</p>"))
            .unwrap();
        assert!(id > 0);
        assert!(store.page_exists("https://a.gov.si/seed").unwrap());
    }

    #[test]
    fn test_terminal_state_never_reverts() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let store = storage.conn();

        store
            .transition_page("https://a.gov.si/", None, &html("<p>one</p>"))
            .unwrap();
        let result = store.transition_page("https://a.gov.si/", None, &html("<p>two</p>"));

        assert!(matches!(
            result,
            Err(StorageError::InvalidTransition {
                from: PageType::Html,
                to: PageType::Html,
                ..
            })
        ));

        let (_, created) = store.create_page_frontier("https://a.gov.si/", None).unwrap();
        assert!(!created);
        let page = store.page_by_url("https://a.gov.si/").unwrap().unwrap();
        assert_eq!(page.page_type, PageType::Html);
        assert_eq!(page.html_content.as_deref(), Some("<p>one</p>"));
    }

    #[test]
    fn test_transition_to_frontier_rejected() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let mut transition = html("<p>x</p>");
        transition.page_type = PageType::Frontier;

        let result = storage
            .conn()
            .transition_page("https://a.gov.si/", None, &transition);
        assert!(matches!(result, Err(StorageError::InvalidTransition { .. })));
    }

    #[test]
    fn test_hash_exists_only_for_html_pages() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let store = storage.conn();
        let hash = ContentHash::of(b"<p>same</p>");

        assert!(!store.hash_exists(&hash).unwrap());

        let duplicate = PageTransition {
            page_type: PageType::Duplicate,
            html_content: None,
            ..html("<p>same</p>")
        };
        store
            .transition_page("https://a.gov.si/dup", None, &duplicate)
            .unwrap();
        assert!(!store.hash_exists(&hash).unwrap());

        store
            .transition_page("https://a.gov.si/", None, &html("<p>same</p>"))
            .unwrap();
        assert!(store.hash_exists(&hash).unwrap());
    }

    #[test]
    fn test_links_images_and_payloads() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let store = storage.conn();

        let from = store
            .transition_page("https://a.gov.si/", None, &html("<p>x</p>"))
            .unwrap();
        let (to, _) = store.create_page_frontier("https://a.gov.si/about", None).unwrap();

        assert!(store.create_link(from, to).unwrap());
        assert!(!store.create_link(from, to).unwrap());

        store
            .create_image(
                from,
                &ImageRecord {
                    filename: "logo.png".to_string(),
                    content_type: Some("image/png".to_string()),
                    data: "iVBORw0KGgo=".to_string(),
                    accessed_at: Utc::now(),
                },
            )
            .unwrap();

        let binary = PageTransition {
            page_type: PageType::Binary,
            hash: None,
            html_content: None,
            http_status_code: None,
            accessed_at: Utc::now(),
        };
        let doc = store
            .transition_page("https://a.gov.si/a.pdf", None, &binary)
            .unwrap();
        store
            .create_binary_resource(doc, DataType::Pdf, "JVBERi0=")
            .unwrap();

        assert_eq!(store.count_links().unwrap(), 1);
        assert_eq!(store.count_images().unwrap(), 1);
        assert_eq!(store.count_binary_resources().unwrap(), 1);
        assert_eq!(store.count_pages_by_type(PageType::Html).unwrap(), 1);
        assert_eq!(store.count_pages_by_type(PageType::Frontier).unwrap(), 1);
        assert_eq!(store.count_pages_by_type(PageType::Binary).unwrap(), 1);
    }

    #[test]
    fn test_rolled_back_transaction_leaves_nothing() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        {
            let tx = storage.transaction().unwrap();
            tx.upsert_site("a.gov.si", None, None).unwrap();
            tx.create_page_frontier("https://a.gov.si/x", None).unwrap();
        }

        assert_eq!(storage.conn().count_sites().unwrap(), 0);
        assert!(!storage.conn().page_exists("https://a.gov.si/x").unwrap());
    }

    #[test]
    fn test_concurrent_frontier_creation_single_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crawl.sqlite");
        SqliteStorage::new(&path).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let path = path.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let mut storage = SqliteStorage::new(&path).unwrap();
                    barrier.wait();
                    let tx = storage.transaction().unwrap();
                    let (_, created) = tx
                        .create_page_frontier("https://a.gov.si/shared", None)
                        .unwrap();
                    tx.commit().unwrap();
                    created
                })
            })
            .collect();

        let created: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(created.iter().filter(|c| **c).count(), 1);

        let storage = SqliteStorage::new(&path).unwrap();
        let rows: i64 = storage
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM page WHERE url = 'https://a.gov.si/shared'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(rows, 1);
    }
}
