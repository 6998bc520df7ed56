//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use paper_harvest::config::Config;
use paper_harvest::crawler::record::{ABSTRACT_NOT_FOUND, FAILED_AFTER_RETRIES, TITLE_NOT_FOUND, UNKNOWN};
use paper_harvest::crawler::{crawl, StopReason};
use paper_harvest::output::{load_statistics, CsvRecordStore, RecordStore};
use paper_harvest::PaperRecord;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast test configuration writing into `dir`
fn create_test_config(start_url: String, dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.start_url = start_url;
    config.crawler.worker_count = 3;
    config.crawler.save_interval_pages = 2;
    config.crawler.crawl_delay_ms = 0;
    config.crawler.retry_attempts = 3;
    config.crawler.retry_delay_ms = 0;
    config.crawler.page_load_timeout_secs = 1;
    config.crawler.next_control_timeout_ms = 200;
    config.crawler.poll_interval_ms = 50;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.output_path = dir.path().join("final.csv").display().to_string();
    config.output.checkpoint_path = dir.path().join("temp.csv").display().to_string();
    config.output.download_dir = dir.path().join("downloads").display().to_string();
    config
}

/// A listing page with the given item numbers and an optional next page
fn listing_page(items: &[u32], next: Option<u32>) -> String {
    let mut body = String::from("<html><body><ul>");
    for n in items {
        body.push_str(&format!(
            r#"<li><span class="uscb-default-x-column-title">Listing title {n}</span>
               <a href="/library/working-papers/2023/paper-{n}.html">Read</a></li>"#
        ));
    }
    body.push_str("</ul>");
    if let Some(page) = next {
        body.push_str(&format!(r#"<a class="nextButton" href="/list/{page}.html">Next</a>"#));
    }
    body.push_str("</body></html>");
    body
}

/// An item page with full metadata and one PDF link
fn item_page(n: u32) -> String {
    format!(
        r#"<html><body>
        <h1 class="cmp-title__text">Working Paper {n}</h1>
        <time itemprop="datePublished">June {n}, 2023</time>
        <div itemprop="author">Author {n}</div>
        <div class="cmp-text">Abstract of paper {n}.</div>
        <a href="/files/paper-{n}.pdf">PDF</a>
        <a href="/library/working-papers/series.html">All papers</a>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn read_records(path: &str) -> Vec<PaperRecord> {
    CsvRecordStore::new()
        .read_records(Path::new(path))
        .expect("Failed to read records")
}

#[tokio::test]
async fn test_full_crawl_three_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/list/1.html", listing_page(&[1, 2], Some(2))).await;
    mount_html(&mock_server, "/list/2.html", listing_page(&[3, 4], Some(3))).await;
    mount_html(&mock_server, "/list/3.html", listing_page(&[5, 6], None)).await;

    for n in [1, 2, 3, 5, 6] {
        mount_html(
            &mock_server,
            &format!("/library/working-papers/2023/paper-{}.html", n),
            item_page(n),
        )
        .await;
    }

    // Item 4 fails on every attempt
    Mock::given(method("GET"))
        .and(path("/library/working-papers/2023/paper-4.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/list/1.html", base_url), &dir);
    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::Completed);
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.records, 6);
    assert_eq!(report.failed_records, 1);
    assert_eq!(report.checkpoints_written, 1);

    let records = read_records(&config.output.output_path);
    assert_eq!(records.len(), 6);

    for (i, record) in records.iter().enumerate() {
        let n = i + 1;
        assert_eq!(
            record.link,
            format!("{}/library/working-papers/2023/paper-{}.html", base_url, n),
            "records must keep discovery order"
        );
    }

    let first = &records[0];
    assert_eq!(first.title, "Working Paper 1");
    assert_eq!(first.date_published, "June 1, 2023");
    assert_eq!(first.authors, "Author 1");
    assert_eq!(first.abstract_text, "Abstract of paper 1.");
    assert_eq!(
        first.download_links,
        vec![format!("{}/files/paper-1.pdf", base_url)]
    );
    assert_eq!(first.file_count, 1);
    assert!(first.downloaded_files.is_empty());
    assert_eq!(first.error, None);

    let failed = &records[3];
    assert_eq!(failed.error.as_deref(), Some(FAILED_AFTER_RETRIES));
    assert_eq!(failed.title, TITLE_NOT_FOUND);
    assert_eq!(failed.date_published, UNKNOWN);
    assert_eq!(failed.authors, UNKNOWN);
    assert_eq!(failed.abstract_text, ABSTRACT_NOT_FOUND);
    assert!(failed.download_links.is_empty());
    assert_eq!(failed.file_count, 0);

    // Checkpoint was written once, after page 2
    let checkpoint = read_records(&config.output.checkpoint_path);
    assert_eq!(checkpoint.len(), 4);
    assert_eq!(checkpoint[..], records[..4]);
}

#[tokio::test]
async fn test_page_load_timeout_flushes_progress() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/list/1.html", listing_page(&[1, 2], Some(2))).await;
    // Page 2 never shows the listing marker
    mount_html(
        &mock_server,
        "/list/2.html",
        "<html><body><p>Temporarily unavailable</p></body></html>".to_string(),
    )
    .await;
    for n in [1, 2] {
        mount_html(
            &mock_server,
            &format!("/library/working-papers/2023/paper-{}.html", n),
            item_page(n),
        )
        .await;
    }

    let config = create_test_config(format!("{}/list/1.html", base_url), &dir);
    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::PageLoadTimeout);
    assert_eq!(report.pages_visited, 1);
    assert_eq!(report.checkpoints_written, 0);

    let records = read_records(&config.output.output_path);
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].title, "Working Paper 2");
    assert!(!Path::new(&config.output.checkpoint_path).exists());
}

#[tokio::test]
async fn test_unreachable_start_page_times_out() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(format!("{}/list/1.html", mock_server.uri()), &dir);
    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.stop_reason, StopReason::PageLoadTimeout);
    assert_eq!(report.pages_visited, 0);
    assert_eq!(report.records, 0);
    assert!(read_records(&config.output.output_path).is_empty());
}

#[tokio::test]
async fn test_crawl_with_downloads() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/list/1.html", listing_page(&[1, 2], None)).await;
    mount_html(
        &mock_server,
        "/library/working-papers/2023/paper-1.html",
        item_page(1),
    )
    .await;
    mount_html(
        &mock_server,
        "/library/working-papers/2023/paper-2.html",
        item_page(2),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/files/paper-1.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 paper one".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/paper-2.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(format!("{}/list/1.html", base_url), &dir);
    config.output.download_files = true;

    let report = crawl(&config).await.expect("Crawl failed");
    assert_eq!(report.records, 2);

    let download_dir = Path::new(&config.output.download_dir);
    let saved = download_dir.join("paper-1.pdf");
    assert_eq!(std::fs::read(&saved).unwrap(), b"%PDF-1.4 paper one");

    let records = read_records(&config.output.output_path);
    assert_eq!(records[0].downloaded_files, vec![saved.display().to_string()]);
    assert_eq!(records[0].file_count, 1);
    assert_eq!(records[0].error, None);

    assert!(records[1].downloaded_files.is_empty());
    assert_eq!(records[1].file_count, 1);
    let error = records[1].error.as_deref().expect("download error recorded");
    assert!(error.starts_with(&format!("{}/files/paper-2.pdf: ", base_url)));
    assert!(error.contains("404"));

    let stats = load_statistics(Path::new(&config.output.output_path)).unwrap();
    assert_eq!(stats.total_records, 2);
    assert_eq!(stats.files_downloaded, 1);
    assert_eq!(stats.failed_records, 1);
}

#[tokio::test]
async fn test_max_pages_stops_early() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let dir = TempDir::new().unwrap();

    mount_html(&mock_server, "/list/1.html", listing_page(&[1], Some(2))).await;
    mount_html(&mock_server, "/list/2.html", listing_page(&[2], None)).await;
    for n in [1, 2] {
        mount_html(
            &mock_server,
            &format!("/library/working-papers/2023/paper-{}.html", n),
            item_page(n),
        )
        .await;
    }

    let mut config = create_test_config(format!("{}/list/1.html", base_url), &dir);
    config.crawler.max_pages = Some(1);

    let report = crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.pages_visited, 1);
    assert_eq!(read_records(&config.output.output_path).len(), 1);
}
