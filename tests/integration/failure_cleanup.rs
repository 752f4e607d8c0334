//! Integration tests for failure paths
//!
//! Every failure must surface with the right status and leave the work
//! root exactly as empty as it started.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use webapp_bundler::capture::PageRenderer;
use webapp_bundler::{GenerateRequest, MockOutcome, MockRenderer};

use super::common::fixtures::{generate_request, Sabotage, SabotageRenderer, WorkRoot};

async fn error_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn post_my_app(root: &WorkRoot, renderer: Arc<dyn PageRenderer>) -> Response {
    root.router(renderer)
        .oneshot(generate_request(serde_json::json!({
            "appName": "My App",
            "websiteUrl": "https://example.com"
        })))
        .await
        .unwrap()
}

/// Missing fields are rejected before any workspace exists
#[tokio::test]
async fn test_missing_fields_have_no_side_effects() {
    let bodies = [
        serde_json::json!({}),
        serde_json::json!({ "appName": "My App" }),
        serde_json::json!({ "websiteUrl": "https://example.com" }),
        serde_json::json!({ "appName": "", "websiteUrl": "https://example.com" }),
        serde_json::json!({ "appName": "My App", "websiteUrl": "" }),
    ];

    for body in bodies {
        let root = WorkRoot::new();
        let mock = Arc::new(MockRenderer::default());
        let response = root
            .router(mock.clone())
            .oneshot(generate_request(body.clone()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(
            error_body(response).await,
            serde_json::json!({ "error": "Missing required fields" })
        );
        assert_eq!(mock.calls(), 0);
        root.assert_empty();
    }
}

/// Bodies that carry no JSON fields count as missing fields, not bad JSON
#[tokio::test]
async fn test_empty_or_undeclared_body_is_missing_fields() {
    let requests = [
        Request::builder()
            .method(Method::POST)
            .uri("/generate-app")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::empty())
            .unwrap(),
        Request::builder()
            .method(Method::POST)
            .uri("/generate-app")
            .body(Body::from(
                r#"{"appName":"My App","websiteUrl":"https://example.com"}"#,
            ))
            .unwrap(),
    ];

    for request in requests {
        let root = WorkRoot::new();
        let mock = Arc::new(MockRenderer::default());
        let response = root.router(mock.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error_body(response).await,
            serde_json::json!({ "error": "Missing required fields" })
        );
        assert_eq!(mock.calls(), 0);
        root.assert_empty();
    }
}

/// Markup that deflate cannot shrink much, so the archive spans many frames
fn incompressible_page(len: usize) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut page = String::with_capacity(len + 16);
    page.push_str("<pre>");
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        page.push(ALPHABET[(state % ALPHABET.len() as u64) as usize] as char);
    }
    page.push_str("</pre>");
    page
}

/// A client that disconnects mid-download still triggers cleanup
#[tokio::test]
async fn test_abandoned_download_is_cleaned_up() {
    let root = WorkRoot::new();
    let renderer = Arc::new(MockRenderer::new(MockOutcome::Page(incompressible_page(
        2 * 1024 * 1024,
    ))));
    let response = post_my_app(&root, renderer).await;
    assert_eq!(response.status(), StatusCode::OK);

    let declared_len: usize = response.headers()[header::CONTENT_LENGTH]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();

    let mut body = response.into_body();
    let frame = body
        .frame()
        .await
        .expect("body ended early")
        .expect("first frame failed");
    let first_len = frame.into_data().map(|d| d.len()).unwrap_or_default();
    assert!(first_len > 0);
    assert!(first_len < declared_len, "archive fit in one frame");

    // Workspace directory and archive are still in use.
    assert_eq!(root.entries().len(), 2);

    drop(body);
    root.wait_until_empty().await;
}

/// Names that sanitize to nothing are a client error with no side effects
#[tokio::test]
async fn test_unsanitizable_name_is_rejected() {
    let root = WorkRoot::new();
    let mock = Arc::new(MockRenderer::default());
    let response = root
        .router(mock.clone())
        .oneshot(generate_request(serde_json::json!({
            "appName": "../..",
            "websiteUrl": "https://example.com"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(mock.calls(), 0);
    root.assert_empty();
}

/// Non-resolving hosts become a 500 with nothing left behind
#[tokio::test]
async fn test_navigation_failure() {
    let root = WorkRoot::new();
    let response = post_my_app(
        &root,
        Arc::new(MockRenderer::new(MockOutcome::Navigation(
            "net::ERR_NAME_NOT_RESOLVED".into(),
        ))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        error_body(response).await,
        serde_json::json!({ "error": "Internal server error" })
    );
    root.assert_empty();
}

#[tokio::test]
async fn test_capture_timeout() {
    let root = WorkRoot::new();
    let response = post_my_app(&root, Arc::new(MockRenderer::new(MockOutcome::Timeout))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    root.assert_empty();
}

#[tokio::test]
async fn test_renderer_unavailable() {
    let root = WorkRoot::new();
    let response = post_my_app(
        &root,
        Arc::new(MockRenderer::new(MockOutcome::Unavailable(
            "no chrome binary".into(),
        ))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert!(!body.to_string().contains("chrome"), "details leaked: {body}");
    root.assert_empty();
}

#[tokio::test]
async fn test_write_failure() {
    let root = WorkRoot::new();
    let renderer = Arc::new(SabotageRenderer::new(root.path(), Sabotage::RemoveWorkspace));
    let response = post_my_app(&root, renderer).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert!(
        !body.to_string().contains(&root.path().display().to_string()),
        "internal path leaked: {body}"
    );
    root.assert_empty();
}

#[tokio::test]
async fn test_archive_failure() {
    let root = WorkRoot::new();
    let renderer = Arc::new(SabotageRenderer::new(root.path(), Sabotage::BlockArchive));
    let response = post_my_app(&root, renderer).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    root.assert_empty();
}

#[derive(Clone, Copy)]
enum FailingStage {
    Navigation,
    Timeout,
    Write,
    Archive,
}

fn failing_renderer(root: &WorkRoot, stage: FailingStage) -> Arc<dyn PageRenderer> {
    match stage {
        FailingStage::Navigation => Arc::new(MockRenderer::new(MockOutcome::Navigation(
            "dns".into(),
        ))),
        FailingStage::Timeout => Arc::new(MockRenderer::new(MockOutcome::Timeout)),
        FailingStage::Write => Arc::new(SabotageRenderer::new(
            root.path(),
            Sabotage::RemoveWorkspace,
        )),
        FailingStage::Archive => {
            Arc::new(SabotageRenderer::new(root.path(), Sabotage::BlockArchive))
        }
    }
}

/// The service reports distinct kinds for each failing stage
#[tokio::test]
async fn test_error_kinds_by_stage() {
    let cases = [
        (FailingStage::Navigation, "navigation"),
        (FailingStage::Timeout, "capture_timeout"),
        (FailingStage::Write, "write"),
        (FailingStage::Archive, "archive"),
    ];

    for (stage, expected_kind) in cases {
        let root = WorkRoot::new();
        let service = root.service(failing_renderer(&root, stage));
        let request = GenerateRequest::new("My App", "https://example.com")
            .validate()
            .unwrap();

        let err = service.generate(request).await.unwrap_err();
        assert_eq!(err.kind(), expected_kind);
        root.assert_empty();
    }
}
