mod support;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use std::fs;
use support::TestApp;
use tower::ServiceExt as _;

#[tokio::test]
async fn root_and_health_are_alive() {
    let app = TestApp::new();

    let (status, body) = app.request_json(Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to the Follow-up Document Generator API");

    let (status, body) = app.request_json(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn physicians_start_empty() {
    let app = TestApp::new();

    let (status, body) = app.request_json(Method::GET, "/physicians", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn add_physician_is_idempotent_ignoring_case() {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(Method::POST, "/physicians", Some(json!({ "name": "  Dr. Klickovich " })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Dr. Klickovich");
    assert_eq!(body["added"], true);

    let (status, body) = app
        .request_json(Method::POST, "/add-physician", Some(json!({ "name": "DR. KLICKOVICH" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["added"], false);
    assert_eq!(body["message"], "Physician 'Dr. Klickovich' already exists.");

    let (_, body) = app.request_json(Method::GET, "/physicians", None).await;
    assert_eq!(body, json!(["Dr. Klickovich"]));
}

#[tokio::test]
async fn blank_or_missing_name_is_rejected() {
    let app = TestApp::new();

    for payload in [json!({ "name": "   " }), json!({})] {
        let (status, body) = app
            .request_json(Method::POST, "/physicians", Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Physician name is required.");
    }
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(Method::POST, "/physicians", Some(json!("just a string")))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn corrupt_store_is_a_server_error() {
    let app = TestApp::new();
    fs::write(app.cfg.physicians_file(), "{oops").unwrap();

    let (status, body) = app.request_json(Method::GET, "/physicians", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("not valid JSON"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_adds_store_one_entry() {
    let app = TestApp::new();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let router = app.router.clone();
            let name = if i % 2 == 0 { "Dr. Same" } else { "dr. same" };
            let request = Request::builder()
                .method(Method::POST)
                .uri("/physicians")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "name": name }).to_string()))
                .unwrap();
            tokio::spawn(async move { router.oneshot(request).await.unwrap().status() })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::OK);
    }
    let (_, body) = app.request_json(Method::GET, "/physicians", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn openapi_document_lists_endpoints() {
    let app = TestApp::new();

    let (status, body) = app
        .request_json(Method::GET, "/api-docs/openapi.json", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    for path in ["/", "/physicians", "/generate-doc", "/upload-documents"] {
        assert!(body["paths"].get(path).is_some(), "missing {path}");
    }
}
