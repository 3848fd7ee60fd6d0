//! End-to-end crawls over HTML pages, robots.txt and sitemaps

use crate::create_test_config;
use crawldb::crawler::Crawler;
use crawldb::state::PageType;
use crawldb::storage::{CrawlStore, SqliteStorage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_robots(server: &MockServer, content: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(content))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nAllow: /").await;

    let home = r#"<a href="/page1">Page 1</a>
        <a href="page2">Page 2</a>
        <a href="https://example.com/">Elsewhere</a>
        <a href="mailto:info@example.com">Mail</a>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(home))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(r#"Content 1 <a href="/">Home</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Same body as the home page
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html(home))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");
    let config = create_test_config(vec![format!("{}/", base_url)], &db_path);

    let crawler = Crawler::new(&config).expect("Failed to create crawler");
    let report = crawler.run().await.expect("Crawl failed");

    assert_eq!(report.pages_html, 2);
    assert_eq!(report.pages_duplicate, 1);
    assert_eq!(report.failed, 0);

    let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    let store = storage.conn();

    let home_page = store
        .page_by_url(&format!("{}/", base_url))
        .unwrap()
        .expect("home page stored");
    assert_eq!(home_page.page_type, PageType::Html);
    assert_eq!(home_page.http_status_code, Some(200));
    assert!(home_page.html_content.unwrap().contains("Page 1"));

    let duplicate = store
        .page_by_url(&format!("{}/page2", base_url))
        .unwrap()
        .expect("duplicate page stored");
    assert_eq!(duplicate.page_type, PageType::Duplicate);
    assert_eq!(duplicate.html_content, None);
    assert_eq!(duplicate.hash, home_page.hash);

    assert!(!store.page_exists("https://example.com/").unwrap());
    assert_eq!(store.count_sites().unwrap(), 1);
    let site = store.site_by_domain("127.0.0.1").unwrap().unwrap();
    assert_eq!(site.robots_content.as_deref(), Some("User-agent: *\nAllow: /"));
    assert_eq!(home_page.site_id, Some(site.id));

    // home -> page1, home -> page2, page1 -> home, page2 -> page1, page2 -> page2
    assert_eq!(store.count_links().unwrap(), 5);
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, "User-agent: *\nDisallow: /private/").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/public">Public</a> <a href="/private/secret">Secret</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html("Public content"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("Secret content"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");
    let config = create_test_config(vec![format!("{}/", base_url)], &db_path);

    let report = Crawler::new(&config).unwrap().run().await.unwrap();
    assert_eq!(report.pages_html, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let store = storage.conn();
    assert!(!store
        .page_exists(&format!("{}/private/secret", base_url))
        .unwrap());
    assert_eq!(
        store
            .page_by_url(&format!("{}/public", base_url))
            .unwrap()
            .unwrap()
            .page_type,
        PageType::Html
    );
}

#[tokio::test]
async fn test_missing_robots_allows_all() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // No robots.txt mock: wiremock answers 404
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<a href="/about">About</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("About us"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");
    let config = create_test_config(vec![format!("{}/", base_url)], &db_path);

    let report = Crawler::new(&config).unwrap().run().await.unwrap();
    assert_eq!(report.pages_html, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let site = storage
        .conn()
        .site_by_domain("127.0.0.1")
        .unwrap()
        .unwrap();
    assert_eq!(site.robots_content, None);
    assert_eq!(site.sitemap_content, None);
}

#[tokio::test]
async fn test_sitemap_seeds_unlinked_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(
        &mock_server,
        &format!("User-agent: *\nDisallow: /admin\nSitemap: {}/sitemap.xml", base_url),
    )
    .await;

    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/hidden</loc></url>
  <url><loc>{base}/admin</loc></url>
  <url><loc>https://example.com/outside</loc></url>
</urlset>"#,
        base = base_url
    );

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sitemap))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("No links here"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/hidden"))
        .respond_with(html("Only in the sitemap"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(html("Admin"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");
    let config = create_test_config(vec![format!("{}/", base_url)], &db_path);

    let report = Crawler::new(&config).unwrap().run().await.unwrap();
    assert_eq!(report.pages_html, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let store = storage.conn();
    assert!(!store.page_exists("https://example.com/outside").unwrap());
    assert_eq!(store.count_links().unwrap(), 0);

    let site = store.site_by_domain("127.0.0.1").unwrap().unwrap();
    assert_eq!(
        site.sitemap_content,
        Some(format!("{}/sitemap.xml", base_url))
    );
}

#[tokio::test]
async fn test_unreachable_seed_ends_run() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");
    // Nothing listens on port 1
    let config = create_test_config(vec!["http://127.0.0.1:1/".to_string()], &db_path);

    let report = Crawler::new(&config).unwrap().run().await.unwrap();

    assert_eq!(report.pages_stored(), 0);
    assert_eq!(report.unreachable, 1);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(
        storage.conn().count_pages_by_type(PageType::Html).unwrap(),
        0
    );
}
