//! Extraction against a mock directory site

use crate::{aberdeen, create_test_config, listing_page, result_page};
use listing_harvest::storage::{read_url_column, URL_HEADER};
use listing_harvest::{
    discover_urls, extract_records, Category, CrawlRequest, HarvestError, ProgressReporter,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_url_file(output_dir: &Path, urls: &[String]) {
    let folder = output_dir.join("WA");
    fs::create_dir_all(&folder).unwrap();

    let mut contents = format!("{}\n", URL_HEADER[0]);
    for url in urls {
        contents.push_str(url);
        contents.push('\n');
    }
    fs::write(folder.join("wa_aberdeen_dental_care_urls.csv"), contents).unwrap();
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    csv::Reader::from_path(path)
        .unwrap()
        .records()
        .map(|row| row.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn test_extraction_records_and_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/mip/smile"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page("Smile Dental Care")))
        .expect(1)
        .mount(&mock_server)
        .await;

    // A page without a business name is not retried
    Mock::given(method("GET"))
        .and(path("/mip/nameless"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>Gone</p></body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mip/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let urls: Vec<String> = ["smile", "nameless", "broken", "smile"]
        .iter()
        .map(|name| format!("{}/mip/{}", base_url, name))
        .collect();
    write_url_file(out.path(), &urls);

    let config = create_test_config(&base_url, out.path());
    let report = extract_records(
        &config,
        &aberdeen(),
        &Category::from_search_term("dental care"),
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Extraction failed");

    assert_eq!(report.record_count, 1);
    assert_eq!(report.failed_count, 2);
    assert_eq!(report.skipped, 0);
    assert!(!report.cancelled);

    let rows = read_rows(&report.path);
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0],
        vec![
            "Smile Dental Care",
            "SmileDentalCare@gmail.com",
            "(360) 555-0100",
            "Smile@123",
            "101 Main St, Aberdeen, WA 98520",
            "46.97",
            "-123.81",
            "dental_care",
            "Smile Dental Care",
            "WA",
            "Aberdeen",
        ]
    );

    let failed = read_url_column(&report.failed_path).unwrap();
    assert_eq!(
        failed,
        vec![
            format!("{}/mip/nameless", base_url),
            format!("{}/mip/broken", base_url),
        ]
    );
}

#[tokio::test]
async fn test_missing_fields_use_marker() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/mip/bare"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><h1>Harbor Chiropractic</h1></body></html>"),
        )
        .mount(&mock_server)
        .await;

    write_url_file(out.path(), &[format!("{}/mip/bare", base_url)]);

    let config = create_test_config(&base_url, out.path());
    let report = extract_records(
        &config,
        &aberdeen(),
        &Category::from_search_term("dental care"),
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Extraction failed");

    let rows = read_rows(&report.path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Harbor Chiropractic");
    assert_eq!(rows[0][2], "N/A");
    assert_eq!(rows[0][4], "N/A");
    assert_eq!(rows[0][5], "N/A");
    assert_eq!(rows[0][6], "N/A");

    // Nothing failed, but the failed file is still rewritten
    assert!(read_url_column(&report.failed_path).unwrap().is_empty());
}

#[tokio::test]
async fn test_missing_url_file_is_reported() {
    let out = TempDir::new().unwrap();
    let config = create_test_config("http://127.0.0.1:9", out.path());

    let result = extract_records(
        &config,
        &aberdeen(),
        &Category::from_search_term("dental care"),
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await;

    match result {
        Err(HarvestError::UrlFileMissing { path }) => {
            assert!(path.ends_with("WA/wa_aberdeen_dental_care_urls.csv"));
        }
        other => panic!("expected UrlFileMissing, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancelled_extraction_skips_everything() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page("Never")))
        .expect(0)
        .mount(&mock_server)
        .await;

    write_url_file(
        out.path(),
        &[format!("{}/mip/a", base_url), format!("{}/mip/b", base_url)],
    );

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = create_test_config(&base_url, out.path());
    let report = extract_records(
        &config,
        &aberdeen(),
        &Category::from_search_term("dental care"),
        false,
        &ProgressReporter::silent(),
        &cancel,
    )
    .await
    .expect("Extraction failed");

    assert!(report.cancelled);
    assert_eq!(report.record_count, 0);
    assert_eq!(report.skipped, 2);
    assert!(!report.path.exists());
    assert!(!report.failed_path.exists(), "a cancelled run leaves the failed file alone");
}

#[tokio::test]
async fn test_discovered_urls_feed_concurrent_extraction() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    let paths: Vec<String> = (0..6).map(|i| format!("/mip/clinic-{}", i)).collect();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(result_page(&paths, false)))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/mip/clinic-\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page("Harbor Urgent Care")))
        .expect(6)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base_url, out.path());
    config.extraction.workers = 3;

    let request = CrawlRequest::new("urgent care", aberdeen());
    let discovered = discover_urls(
        &config,
        &request,
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Discovery failed");
    assert_eq!(discovered.url_count, 6);

    let report = extract_records(
        &config,
        &request.region,
        &request.category(),
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Extraction failed");

    assert_eq!(report.record_count, 6);
    assert_eq!(report.failed_count, 0);
    assert_eq!(
        report.path,
        out.path().join("WA").join("wa_aberdeen_urgent_care.csv")
    );
    assert_eq!(read_rows(&report.path).len(), 6);
}
