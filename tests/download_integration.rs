//! Integration tests for the transfer engine.
//!
//! These tests run full transfers against mock HTTP servers and check the
//! saved file, the reported outcome and the wget-style output lines.

use std::time::{Duration, Instant};

use tempfile::TempDir;
use wget_core::{DownloadError, HttpClient, RateLimit, TransferLog, TransferRequest};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        mock_server
    }};
}

#[tokio::test]
async fn test_download_full_flow_preserves_content() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let content = b"This is the complete file content for testing.\nLine 2.\nLine 3.";

    Mock::given(method("GET"))
        .and(path("/docs/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().expect("client builds");
    let url = format!("{}/docs/report.pdf", mock_server.uri());
    let request = TransferRequest::resolve(&url, None, temp_dir.path()).expect("valid url");
    let mut log = TransferLog::capture();

    let outcome = client
        .transfer(&request, &mut log)
        .await
        .expect("download should succeed");

    assert_eq!(outcome.path, temp_dir.path().join("report.pdf"));
    assert_eq!(std::fs::read(&outcome.path).expect("read file"), content);

    let text = log.contents().expect("captured log");
    let banners = [
        "start at ",
        "sending request, awaiting response... status 200 OK",
        "content size: ",
        "saving file to: ",
        "Downloaded [",
        "finished at ",
    ];
    let mut cursor = 0;
    for banner in banners {
        let found = text[cursor..]
            .find(banner)
            .unwrap_or_else(|| panic!("missing or out of order: {banner:?} in {text}"));
        cursor += found + banner.len();
    }
}

#[tokio::test]
async fn test_download_output_name_override() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"v2".to_vec()))
        .mount(&mock_server)
        .await;

    let url = format!("{}/latest", mock_server.uri());
    let request =
        TransferRequest::resolve(&url, Some("release.tar"), temp_dir.path()).expect("valid url");
    let outcome = HttpClient::new()
        .expect("client builds")
        .transfer(&request, &mut TransferLog::capture())
        .await
        .expect("download should succeed");

    assert_eq!(outcome.path, temp_dir.path().join("release.tar"));
    assert!(!temp_dir.path().join("latest").exists());
}

#[tokio::test]
async fn test_download_server_error_is_status_error() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let url = format!("{}/broken", mock_server.uri());
    let request = TransferRequest::resolve(&url, None, temp_dir.path()).expect("valid url");
    let mut log = TransferLog::capture();

    let result = HttpClient::new()
        .expect("client builds")
        .transfer(&request, &mut log)
        .await;

    assert!(
        matches!(result, Err(DownloadError::HttpStatus { status: 503, .. })),
        "{result:?}"
    );
    assert!(!request.destination.exists());
    let text = log.contents().expect("captured log");
    assert!(text.contains("Status 503 Service Unavailable"), "{text}");
    assert!(!text.contains("saving file to"), "{text}");
}

#[tokio::test]
async fn test_download_rate_limited_takes_expected_time() {
    let mock_server = require_mock_server!();
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    // 8 KiB at 16 KiB/s: eight 1 KiB writes, each paced by 62.5ms after the first.
    Mock::given(method("GET"))
        .and(path("/slow.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 8 * 1024]))
        .mount(&mock_server)
        .await;

    let limit: RateLimit = "16k".parse().expect("valid rate");
    let url = format!("{}/slow.bin", mock_server.uri());
    let request = TransferRequest::resolve(&url, None, temp_dir.path())
        .expect("valid url")
        .with_rate_limit(Some(limit));

    let started = Instant::now();
    let outcome = HttpClient::new()
        .expect("client builds")
        .transfer(&request, &mut TransferLog::capture())
        .await
        .expect("download should succeed");

    assert_eq!(outcome.bytes_transferred, 8 * 1024);
    assert!(
        started.elapsed() >= Duration::from_millis(400),
        "throttled transfer finished too fast: {:?}",
        started.elapsed()
    );
}
