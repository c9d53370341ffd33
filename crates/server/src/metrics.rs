//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the mediarelay server:
//! - HTTP request metrics (latency, counts, errors)
//! - Orchestrator status (collected dynamically)
//! - Core task, retrieval and relay counters (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "mediarelay_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 60.0, 300.0, 900.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediarelay_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediarelay_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Concurrency slots currently held.
pub static ACTIVE_SLOTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediarelay_active_slots",
        "Tasks currently holding a retrieval-and-relay slot",
    )
    .unwrap()
});

/// Batches currently being processed.
pub static BATCHES_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "mediarelay_batches_in_flight",
        "Batches currently being processed",
    )
    .unwrap()
});

/// Entries in the proxy pool.
pub static PROXY_POOL_SIZE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("mediarelay_proxy_pool_size", "Entries in the proxy pool").unwrap()
});

/// Register all metrics with the registry.
fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // HTTP
        Box::new(HTTP_REQUEST_DURATION.clone()),
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()),
        // Orchestrator
        Box::new(ACTIVE_SLOTS.clone()),
        Box::new(BATCHES_IN_FLIGHT.clone()),
        Box::new(PROXY_POOL_SIZE.clone()),
    ];

    // Core metrics (tasks, retrieval, relay)
    for metric in collectors
        .into_iter()
        .chain(mediarelay_core::metrics::all_metrics())
    {
        if let Err(e) = registry.register(metric) {
            warn!("Failed to register metric: {}", e);
        }
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// This is called before encoding metrics to update gauges with current values
/// from the orchestrator.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status();
    ACTIVE_SLOTS.set(status.active_slots as i64);
    BATCHES_IN_FLIGHT.set(status.batches_in_flight as i64);
    PROXY_POOL_SIZE.set(status.proxy_count as i64);
}

/// Normalize a path for metric labels.
///
/// Known routes keep their path; anything else is folded into `other`.
pub fn normalize_path(path: &str) -> &'static str {
    match path.trim_end_matches('/') {
        "/download" => "/download",
        "/metrics" => "/metrics",
        "/api/v1/download" => "/api/v1/download",
        "/api/v1/health" => "/api/v1/health",
        "/api/v1/config" => "/api/v1/config",
        "/api/v1/status" => "/api/v1/status",
        _ => "other",
    }
}
