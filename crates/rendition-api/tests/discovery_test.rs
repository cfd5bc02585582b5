//! Discovery API integration tests.
//!
//! Run with: `cargo test -p rendition-api --test discovery_test`

mod helpers;

use helpers::{local_path, setup_mock_app, setup_test_app, INPUT_BUCKET, OUTPUT_BUCKET};
use rendition_core::DiscoveryResult;
use rendition_storage::mock::MockFailure;
use rendition_storage::MockStorage;
use serde_json::{json, Value};

#[tokio::test]
async fn test_missing_key_is_400() {
    let app = setup_test_app().await;

    let response = app.client().get("/discovery").await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["error"].as_str().unwrap().contains("key"));

    let response = app.client().get("/discovery").add_query_param("key", "").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_nothing_uploaded_yet() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/discovery")
        .add_query_param("key", "cat.png")
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({ "original": null, "1080p": [], "720p": [], "480p": [] })
    );
}

#[tokio::test]
async fn test_partial_availability() {
    let app = setup_test_app().await;
    app.put(INPUT_BUCKET, "cat.png", b"png").await;
    app.put(OUTPUT_BUCKET, "720p/cat.webp", b"webp").await;
    app.put(OUTPUT_BUCKET, "720p/cat.jpg", b"jpg").await;
    app.put(OUTPUT_BUCKET, "480p/cat.jpg", b"jpg").await;

    let response = app
        .client()
        .get("/discovery")
        .add_query_param("key", "cat.png")
        .await;
    assert_eq!(response.status_code(), 200);

    let result: DiscoveryResult = response.json();
    let original = result.original.as_deref().unwrap();
    assert!(original.starts_with("http://localhost:4000/files/uploads/cat.png?expires="));

    let body: Value = response.json();
    assert_eq!(body["1080p"], json!([]));
    let formats: Vec<_> = body["720p"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["format"].as_str().unwrap())
        .collect();
    assert_eq!(formats, vec!["webp", "jpg"]);
    assert_eq!(body["480p"].as_array().unwrap().len(), 1);
    assert_eq!(body["480p"][0]["format"], "jpg");
}

#[tokio::test]
async fn test_discovered_urls_are_fetchable() {
    let app = setup_test_app().await;
    app.put(OUTPUT_BUCKET, "1080p/cat.webp", b"webp bytes").await;

    let result: DiscoveryResult = app
        .client()
        .get("/discovery")
        .add_query_param("key", "cat.png")
        .await
        .json();
    let url = &result.by_size.p1080[0].url;

    let response = app.client().get(local_path(url)).await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "image/webp");
    assert_eq!(response.as_bytes().as_ref(), b"webp bytes");
}

#[tokio::test]
async fn test_tampered_url_is_rejected() {
    let app = setup_test_app().await;
    app.put(OUTPUT_BUCKET, "1080p/cat.webp", b"webp").await;
    app.put(OUTPUT_BUCKET, "1080p/dog.webp", b"webp").await;

    let result: DiscoveryResult = app
        .client()
        .get("/discovery")
        .add_query_param("key", "cat.png")
        .await
        .json();
    let url = local_path(&result.by_size.p1080[0].url).replace("cat.webp", "dog.webp");

    let response = app.client().get(&url).await;
    assert_eq!(response.status_code(), 400);

    let response = app.client().get("/files/renditions/1080p/cat.webp").await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_gateway_error_is_500_without_detail() {
    let storage = MockStorage::new();
    storage.put(INPUT_BUCKET, "cat.png");
    storage.fail_exists(OUTPUT_BUCKET, "720p/cat.webp", MockFailure::Gateway);
    let server = setup_mock_app(&storage);

    let response = server.get("/discovery").add_query_param("key", "cat.png").await;

    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["code"], "STORAGE_ERROR");
    assert_eq!(body["error"], "Failed to access storage");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn test_discovery_is_not_cached() {
    let storage = MockStorage::new();
    let server = setup_mock_app(&storage);

    let before: DiscoveryResult = server
        .get("/discovery")
        .add_query_param("key", "cat.png")
        .await
        .json();
    assert!(!before.is_ready());

    storage.put(OUTPUT_BUCKET, "480p/cat.webp");
    let after: DiscoveryResult = server
        .get("/discovery")
        .add_query_param("key", "cat.png")
        .await
        .json();
    assert!(after.is_ready());
    assert_eq!(storage.exists_calls(), 14);
}

#[tokio::test]
async fn test_key_prefix_has_no_original() {
    let app = setup_test_app().await;
    app.put(INPUT_BUCKET, "album/cat.png", b"png").await;

    let result: DiscoveryResult = app
        .client()
        .get("/discovery")
        .add_query_param("key", "album")
        .await
        .json();

    assert!(result.original.is_none());
}

#[tokio::test]
async fn test_blank_key_is_a_regular_lookup() {
    let app = setup_test_app().await;

    let response = app.client().get("/discovery").add_query_param("key", " ").await;

    assert_eq!(response.status_code(), 200);
    let result: DiscoveryResult = response.json();
    assert!(!result.is_ready());
}
