//! Discovery against a mock directory site

use crate::{aberdeen, create_test_config, result_page};
use listing_harvest::state::StopReason;
use listing_harvest::storage::read_url_column;
use listing_harvest::{discover_urls, CrawlRequest, ProgressEvent, ProgressReporter};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn listing_paths(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("/mip/{}-{}", prefix, i)).collect()
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn test_discovery_stops_without_next_page() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let out = TempDir::new().unwrap();

    // Page 2 repeats page 1's listings and has no next control
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(html(result_page(&listing_paths("dental", 15), false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("search_terms", "dental care"))
        .and(query_param("geo_location_terms", "Aberdeen, WA"))
        .respond_with(html(result_page(&listing_paths("dental", 15), true)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, out.path());
    let request = CrawlRequest::new("dental care", aberdeen());
    let report = discover_urls(
        &config,
        &request,
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Discovery failed");

    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.url_count, 15);
    assert_eq!(report.pages_visited, 2);
    assert!(report.persisted);
    assert_eq!(
        report.path,
        out.path().join("WA").join("wa_aberdeen_dental_care_urls.csv")
    );

    let urls = read_url_column(&report.path).unwrap();
    assert_eq!(urls.len(), 15);
    assert_eq!(urls[0], format!("{}/mip/dental-0", base_url));
    assert_eq!(urls[14], format!("{}/mip/dental-14", base_url));
}

#[tokio::test]
async fn test_discovery_stops_after_consecutive_blocks() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();
    let debug = TempDir::new().unwrap();

    // Three pages, each fetched twice (forced wait and one re-fetch)
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<html>Forbidden</html>"))
        .expect(6)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.output.debug_dir = Some(debug.path().to_string_lossy().into_owned());

    let request = CrawlRequest::new("dental care", aberdeen());
    let report = discover_urls(
        &config,
        &request,
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Discovery failed");

    assert_eq!(report.stop_reason, StopReason::FailureThreshold);
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.url_count, 0);
    assert!(!report.persisted);
    assert!(!report.path.exists(), "an empty run must not create the URL file");
    assert!(debug.path().join("debug_403_page_1.html").exists());
    assert!(debug.path().join("debug_403_page_3.html").exists());
}

#[tokio::test]
async fn test_discovery_retries_challenge_once() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(
            "<html><title>Just a moment...</title></html>".to_string(),
        ))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(result_page(&listing_paths("urgent", 3), false)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let request = CrawlRequest::new("urgent care", aberdeen());
    let (progress, mut events) = ProgressReporter::channel();

    let report = discover_urls(&config, &request, false, &progress, &CancellationToken::new())
        .await
        .expect("Discovery failed");
    drop(progress);

    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.url_count, 3);
    assert_eq!(report.pages_visited, 1);

    let mut challenged = false;
    let mut finished = false;
    while let Some(event) = events.recv().await {
        match event {
            ProgressEvent::ChallengeDetected { page: 1, .. } => challenged = true,
            ProgressEvent::DiscoveryFinished { total_urls, .. } => {
                assert_eq!(total_urls, 3);
                finished = true;
            }
            _ => {}
        }
    }
    assert!(challenged);
    assert!(finished);
}

/// Always answers with fresh listings and an enabled next control
struct EndlessResults;

impl Respond for EndlessResults {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_else(|| "1".to_string());

        html(result_page(&listing_paths(&format!("p{}", page), 2), true))
    }
}

#[tokio::test]
async fn test_discovery_honours_page_ceiling() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(EndlessResults)
        .expect(5)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), out.path());
    config.discovery.max_pages = 5;

    let request = CrawlRequest::new("primary care", aberdeen());
    let report = discover_urls(
        &config,
        &request,
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Discovery failed");

    assert_eq!(report.stop_reason, StopReason::PageCeiling);
    assert_eq!(report.pages_visited, 5);
    assert_eq!(report.url_count, 10);
}

#[tokio::test]
async fn test_repeated_discovery_appends() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(html(result_page(&listing_paths("vision", 2), false)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let request = CrawlRequest::new("medical vision care", aberdeen());

    for _ in 0..2 {
        discover_urls(
            &config,
            &request,
            false,
            &ProgressReporter::silent(),
            &CancellationToken::new(),
        )
        .await
        .expect("Discovery failed");
    }

    let path = out
        .path()
        .join("WA")
        .join("wa_aberdeen_medical_vision_care_urls.csv");
    let contents = std::fs::read_to_string(&path).unwrap();

    // One header, both runs' rows
    assert_eq!(contents.matches("Url").count(), 1);
    assert_eq!(read_url_column(&path).unwrap().len(), 4);
}

/// Answers each result page from a fixed script, indexed by page number
struct ScriptedPages(Vec<ResponseTemplate>);

impl Respond for ScriptedPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let page: usize = request
            .url
            .query_pairs()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse().ok())
            .unwrap_or(1);

        self.0
            .get(page - 1)
            .cloned()
            .unwrap_or_else(|| ResponseTemplate::new(404))
    }
}

fn blocked() -> ResponseTemplate {
    ResponseTemplate::new(403).set_body_string("<html>Forbidden</html>")
}

#[tokio::test]
async fn test_cardless_page_does_not_end_run() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // Page 2 loads but carries neither cards nor pagination
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ScriptedPages(vec![
            html(result_page(&listing_paths("a", 2), true)),
            html("<html><body><p>Temporarily unavailable</p></body></html>".to_string()),
            html(result_page(&listing_paths("c", 4), false)),
        ]))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let request = CrawlRequest::new("dental care", aberdeen());
    let report = discover_urls(
        &config,
        &request,
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Discovery failed");

    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.pages_visited, 3);
    assert_eq!(report.url_count, 6);
}

#[tokio::test]
async fn test_productive_page_resets_failure_streak() {
    let mock_server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // fail, fail, productive, fail, fail, fail; blocked pages are fetched twice
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ScriptedPages(vec![
            blocked(),
            blocked(),
            html(result_page(&listing_paths("only", 1), true)),
            blocked(),
            blocked(),
            blocked(),
        ]))
        .expect(11)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), out.path());
    let request = CrawlRequest::new("dental care", aberdeen());
    let report = discover_urls(
        &config,
        &request,
        false,
        &ProgressReporter::silent(),
        &CancellationToken::new(),
    )
    .await
    .expect("Discovery failed");

    assert_eq!(report.stop_reason, StopReason::FailureThreshold);
    assert_eq!(report.pages_visited, 6);
    assert_eq!(report.url_count, 1);
}
