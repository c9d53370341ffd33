//! Common test utilities for in-process API testing with mocks.
//!
//! This module provides a test fixture that builds the router with mock
//! retrieval and relay collaborators injected, so whole batches run without
//! external tools, proxies, or network access.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use mediarelay_core::{
    testing::{MockRelay, MockToolRunner},
    Config, OrchestratorConfig,
};

/// Re-export fixtures for test convenience
pub use mediarelay_core::testing::fixtures;

/// Test fixture for API testing with mock dependencies.
///
/// Provides an in-process router with fully controllable mocks for:
/// - The external fetch tool (MockToolRunner)
/// - The relay service (MockRelay)
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_batch() {
///     let fixture = TestFixture::new();
///
///     let response = fixture.post("/download", json!({
///         "tasks": [{ "url": "https://youtu.be/abc" }],
///         "folder": fixture.folder()
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetch tool - script attempt outcomes
    pub runner: Arc<MockToolRunner>,
    /// Mock relay - script upload failures
    pub relay: Arc<MockRelay>,
    /// Scratch directory used as the batch destination
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestFixture {
    /// Create a new test fixture with fast orchestrator settings.
    pub fn new() -> Self {
        Self::with_orchestrator_config(fixtures::fast_orchestrator_config())
    }

    /// Create a test fixture with custom orchestrator settings.
    pub fn with_orchestrator_config(orchestrator_config: OrchestratorConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let runner = Arc::new(MockToolRunner::new());
        let relay = Arc::new(MockRelay::new());

        let mut config = Config::default();
        config.server.host = std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
        config.orchestrator = orchestrator_config.clone();

        let orchestrator = fixtures::orchestrator_with(
            orchestrator_config,
            Arc::clone(&runner),
            Arc::clone(&relay),
        );

        let state = Arc::new(mediarelay_server::state::AppState::new(
            config,
            Arc::new(orchestrator),
        ));
        let router = mediarelay_server::api::create_router(state);

        Self {
            router,
            runner,
            relay,
            temp_dir,
        }
    }

    /// Destination folder for batches, as a request string.
    pub fn folder(&self) -> String {
        self.temp_dir.path().to_string_lossy().to_string()
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        let body = serde_json::to_string(&body).unwrap();
        self.request("POST", path, Some((body, "application/json"))).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request("POST", path, Some((body.to_string(), "application/json")))
            .await
    }

    /// Send a POST request with custom content type (for testing wrong content types).
    pub async fn post_with_content_type(
        &self,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        self.request("POST", path, Some((body.to_string(), content_type)))
            .await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<(String, &str)>,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some((raw, content_type)) = body {
            request_builder = request_builder.header("Content-Type", content_type);
            Body::from(raw)
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
