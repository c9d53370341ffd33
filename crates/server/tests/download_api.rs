//! Batch download API tests against the in-process router.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;
use mediarelay_core::retrieval::ToolOutput;

const MOCK_REFERENCE_PREFIX: &str = "https://res.cloudinary.com/mock/video/upload/tempfile_";

#[tokio::test]
async fn test_health() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_three_task_batch_on_root_route() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/download",
            json!({
                "tasks": [
                    { "url": "https://www.youtube.com/watch?v=abc" },
                    { "url": "::not a url::" },
                    { "url": "https://t.me/channel/7" }
                ],
                "folder": fixture.folder()
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Download process completed");

    let results = response.body["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results[0].as_str().unwrap().starts_with(MOCK_REFERENCE_PREFIX));
    assert!(results[1]
        .as_str()
        .unwrap()
        .starts_with("Failed to download ::not a url::: InvalidURL"));
    assert!(results[2].as_str().unwrap().starts_with(MOCK_REFERENCE_PREFIX));
}

#[tokio::test]
async fn test_versioned_route_with_explicit_platform() {
    let fixture = TestFixture::new();

    let response = fixture
        .post(
            "/api/v1/download",
            json!({
                "tasks": [{ "url": "https://media.example.com/a.mp4", "platform": "telegram" }],
                "folder": fixture.folder()
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let calls = fixture.runner.invocations().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program.to_string_lossy(), "curl");
}

#[tokio::test]
async fn test_task_failures_do_not_fail_the_batch() {
    let fixture = TestFixture::new();
    fixture
        .runner
        .set_default_outcome(ToolOutput::failure(1, "ERROR: Video unavailable"))
        .await;

    let response = fixture
        .post(
            "/download",
            json!({
                "tasks": [
                    { "url": "https://www.tiktok.com/@a/video/1" },
                    { "url": "https://vimeo.com/2" }
                ],
                "folder": fixture.folder()
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let results = response.body["results"].as_array().unwrap();
    assert!(results[0].as_str().unwrap().contains("RetrievalExhausted"));
    assert!(results[1].as_str().unwrap().contains("UnknownPlatform"));
}

#[tokio::test]
async fn test_empty_task_list() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/download", json!({ "tasks": [], "folder": fixture.folder() }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["results"], json!([]));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let fixture = TestFixture::new();
    let response = fixture.post_raw("/download", "{\"tasks\": [").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid request format");
}

#[tokio::test]
async fn test_wrong_shape_is_bad_request() {
    let fixture = TestFixture::new();
    let response = fixture
        .post("/api/v1/download", json!({ "tasks": "https://youtu.be/a" }))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid request format");
}

#[tokio::test]
async fn test_wrong_content_type_is_bad_request() {
    let fixture = TestFixture::new();
    let response = fixture
        .post_with_content_type("/download", "{\"tasks\": []}", "text/plain")
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid request format");
}

#[tokio::test]
async fn test_unusable_folder_is_server_error() {
    let fixture = TestFixture::new();
    let blocker = fixture.temp_dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let response = fixture
        .post(
            "/download",
            json!({
                "tasks": [{ "url": "https://youtu.be/a" }],
                "folder": blocker.join("nested").to_string_lossy()
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to create folder"));
    assert_eq!(fixture.runner.invocation_count().await, 0);
}

#[tokio::test]
async fn test_status_reflects_finished_batch() {
    let fixture = TestFixture::new();

    fixture
        .post(
            "/download",
            json!({
                "tasks": [{ "url": "https://youtu.be/a" }, { "url": "bad" }],
                "folder": fixture.folder()
            }),
        )
        .await;

    let response = fixture.get("/api/v1/status").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["max_concurrent_tasks"], 2);
    assert_eq!(response.body["active_slots"], 0);
    assert_eq!(response.body["batches_in_flight"], 0);
    assert_eq!(response.body["tasks_succeeded"], 1);
    assert_eq!(response.body["tasks_failed"], 1);
    assert_eq!(response.body["proxy_count"], 3);
}

#[tokio::test]
async fn test_config_is_sanitized() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["relay"]["credential_configured"], false);
    assert!(response.body["relay"].get("cloudinary_url").is_none());
    assert_eq!(response.body["orchestrator"]["max_concurrent_tasks"], 2);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("mediarelay_http_requests_total"));
    assert!(response.text.contains("mediarelay_active_slots"));
}
