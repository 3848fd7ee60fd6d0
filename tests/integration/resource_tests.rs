//! End-to-end crawls over binary documents and images

use crate::create_test_config;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crawldb::crawler::Crawler;
use crawldb::output::load_statistics;
use crawldb::state::PageType;
use crawldb::storage::{CrawlStore, SqliteStorage};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF_BYTES: &[u8] = b"%PDF-1.4 test document";
const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n";

async fn mount_documents(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><body>
                    <a href="/files/report.pdf">Report</a>
                    <a href="/files/slides.PPTX">Slides</a>
                    <a href="/other">Other</a>
                    <img src="/img/logo.png">
                    <img src="/img/logo.png">
                    <img src="/img/photo">
                    </body></html>"#,
                )
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><body><a href="/files/report.pdf">Again</a></body></html>"#)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PDF_BYTES))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/slides.PPTX"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 64]))
        .expect(1)
        .mount(server)
        .await;

    // Served as application/octet-stream; the stored type comes from the extension
    Mock::given(method("GET"))
        .and(path("/img/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_BYTES))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/photo"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"\xff\xd8\xff".to_vec())
                .insert_header("content-type", "image/jpeg"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_binary_documents_and_images() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_documents(&mock_server).await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawl.sqlite");
    let mut config = create_test_config(vec![format!("{}/", base_url)], &db_path);
    // Fits the PDF, not the 64-byte slides
    config.crawler.max_binary_size = 32;

    let report = Crawler::new(&config).unwrap().run().await.unwrap();

    assert_eq!(report.pages_html, 2);
    assert_eq!(report.binaries, 1);
    assert_eq!(report.images, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let store = storage.conn();

    let home = store
        .page_by_url(&format!("{}/", base_url))
        .unwrap()
        .unwrap();
    let report_pdf = store
        .page_by_url(&format!("{}/files/report.pdf", base_url))
        .unwrap()
        .unwrap();
    let slides = store
        .page_by_url(&format!("{}/files/slides.PPTX", base_url))
        .unwrap()
        .unwrap();

    assert_eq!(report_pdf.page_type, PageType::Binary);
    assert_eq!(report_pdf.html_content, None);
    assert_eq!(report_pdf.site_id, home.site_id);
    assert_eq!(slides.page_type, PageType::Binary);

    let (data_type, data): (String, String) = store
        .query_row(
            "SELECT data_type_code, data FROM page_data WHERE page_id = ?1",
            [report_pdf.id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(data_type, "PDF");
    assert_eq!(STANDARD.decode(data).unwrap(), PDF_BYTES);

    let slides_payloads: i64 = store
        .query_row(
            "SELECT COUNT(*) FROM page_data WHERE page_id = ?1",
            [slides.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(slides_payloads, 0);

    let mut images: Vec<(String, Option<String>)> = store
        .prepare("SELECT filename, content_type FROM image WHERE page_id = ?1 ORDER BY filename")
        .unwrap()
        .query_map([home.id], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    images.sort();
    assert_eq!(
        images,
        vec![
            ("logo.png".to_string(), Some("image/png".to_string())),
            ("photo".to_string(), Some("image/jpeg".to_string())),
        ]
    );

    // home -> report, home -> slides, home -> other, other -> report
    let stats = load_statistics(store).unwrap();
    assert_eq!(stats.links, 4);
    assert_eq!(stats.pages_of(PageType::Binary), 2);
    assert_eq!(stats.binary_resources, 1);
    assert_eq!(stats.images, 2);
}
