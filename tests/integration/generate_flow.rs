//! Integration tests for the happy path
//!
//! Tests the flow: request -> workspace -> capture -> bundle -> zip -> stream,
//! and that nothing is left on disk afterwards.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use webapp_bundler::bundle::BUNDLE_FILES;
use webapp_bundler::{BoundedRenderer, GenerateRequest, MockOutcome, MockRenderer};

use super::common::fixtures::{generate_request, zip_entries, zip_text, WorkRoot};

const EXAMPLE_PAGE: &str =
    "<html><head><title>Example Domain</title></head><body><h1>Example Domain</h1></body></html>";

/// `{appName: "My App", websiteUrl: "https://example.com"}` yields a complete bundle
#[tokio::test]
async fn test_my_app_scenario() {
    let root = WorkRoot::new();
    let mock = Arc::new(MockRenderer::new(MockOutcome::Page(EXAMPLE_PAGE.into())));
    let app = root.router(mock.clone());

    let response = app
        .oneshot(generate_request(serde_json::json!({
            "appName": "My App",
            "websiteUrl": "https://example.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"My App.zip\""
    );
    let declared_len: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.len(), declared_len);

    let mut expected: Vec<String> = BUNDLE_FILES.iter().map(|s| s.to_string()).collect();
    expected.sort();
    assert_eq!(zip_entries(&body), expected);

    let index = zip_text(&body, "index.html");
    assert!(index.contains(&format!(r#"<div id="app-content">{}</div>"#, EXAMPLE_PAGE)));

    let manifest: serde_json::Value =
        serde_json::from_str(&zip_text(&body, "manifest.json")).unwrap();
    assert_eq!(manifest["name"], "My App");
    assert_eq!(manifest["short_name"], "My App");
    assert_eq!(manifest["display"], "standalone");

    assert_eq!(mock.calls(), 1);
    assert_eq!(mock.captured_urls()[0].as_str(), "https://example.com/");

    root.wait_until_empty().await;
}

/// Hostile names still produce a safe download name and a clean root
#[tokio::test]
async fn test_traversal_name_is_sanitized() {
    let root = WorkRoot::new();
    let app = root.router(Arc::new(MockRenderer::default()));

    let response = app
        .oneshot(generate_request(serde_json::json!({
            "appName": "../../etc/passwd",
            "websiteUrl": "https://example.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"etc_passwd.zip\""
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    for entry in zip_entries(&body) {
        assert!(!entry.contains(".."), "entry escapes archive root: {entry}");
    }
    root.wait_until_empty().await;
}

/// Concurrent requests with the same name never share a workspace or archive
#[tokio::test]
async fn test_concurrent_identical_names_do_not_collide() {
    let root = WorkRoot::new();
    let renderer = Arc::new(
        MockRenderer::new(MockOutcome::Page("<p>same</p>".into()))
            .with_delay(Duration::from_millis(20)),
    );
    let service = root.service(renderer);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            let request = GenerateRequest::new("Same Name", "https://example.com")
                .validate()
                .unwrap();
            service.generate(request).await
        }));
    }

    let mut bundles = Vec::new();
    for task in tasks {
        bundles.push(task.await.unwrap().expect("generation failed"));
    }

    let dirs: HashSet<_> = bundles.iter().map(|b| b.workspace().dir().to_path_buf()).collect();
    let archives: HashSet<_> = bundles.iter().map(|b| b.archive_path().to_path_buf()).collect();
    assert_eq!(dirs.len(), 8);
    assert_eq!(archives.len(), 8);
    for bundle in &bundles {
        assert!(bundle.archive_path().is_file());
        assert_eq!(bundle.download_name(), "Same Name.zip");
    }

    drop(bundles);
    root.assert_empty();
}

/// Dropping a finished bundle removes its directory and archive
#[tokio::test]
async fn test_cleanup_after_success() {
    let root = WorkRoot::new();
    let service = root.service(Arc::new(MockRenderer::default()));

    let request = GenerateRequest::new("Cleanup", "https://example.com")
        .validate()
        .unwrap();
    let bundle = service.generate(request).await.unwrap();

    let dir = bundle.workspace().dir().to_path_buf();
    let archive = bundle.archive_path().to_path_buf();
    assert!(dir.is_dir());
    assert!(archive.is_file());
    assert!(bundle.size() > 0);

    drop(bundle);
    assert!(!dir.exists());
    assert!(!archive.exists());
    root.assert_empty();
}

/// The capture bound holds across the whole pipeline
#[tokio::test]
async fn test_capture_concurrency_is_bounded() {
    let root = WorkRoot::new();
    let renderer = Arc::new(BoundedRenderer::new(
        MockRenderer::default().with_delay(Duration::from_millis(25)),
        2,
    ));
    let service = root.service(renderer.clone());

    let mut tasks = Vec::new();
    for i in 0..6 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            let request = GenerateRequest::new(format!("App {i}"), "https://example.com")
                .validate()
                .unwrap();
            service.generate(request).await.map(drop)
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(renderer.inner().calls(), 6);
    assert!(renderer.inner().peak_concurrency() <= 2);
    root.assert_empty();
}
