//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Tasks (outcomes, duration)
//! - Retrieval (attempts per route, exhaustion)
//! - Relay (uploads, duration)
//! - Local cleanup

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Orchestrator - Task Metrics
// =============================================================================

/// Batches accepted by the orchestrator.
pub static BATCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("mediarelay_batches_total", "Total batches processed").unwrap()
});

/// Finished tasks by result.
pub static TASKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediarelay_tasks_total", "Total tasks finished"),
        &["result"], // "relayed", "failed"
    )
    .unwrap()
});

/// Task duration in seconds, from launch to record, including the wait for a slot.
pub static TASK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("mediarelay_task_duration_seconds", "Duration of a single task")
            .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Retrieval Metrics
// =============================================================================

/// Tool attempts by route and result.
pub static ATTEMPTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediarelay_attempts_total", "Total retrieval attempts"),
        &["route", "result"], // route: "proxied", "direct", "direct_fetch"
    )
    .unwrap()
});

/// Tasks whose every attempt failed.
pub static RETRIEVALS_EXHAUSTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediarelay_retrievals_exhausted_total",
        "Retrievals that ran out of attempts",
    )
    .unwrap()
});

// =============================================================================
// Relay Metrics
// =============================================================================

/// Relay uploads by result.
pub static RELAYS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("mediarelay_relays_total", "Total relay uploads"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Relay upload duration in seconds.
pub static RELAY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("mediarelay_relay_duration_seconds", "Duration of relay uploads")
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["relay"],
    )
    .unwrap()
});

/// Local files that could not be removed after a task.
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "mediarelay_cleanup_failures_total",
        "Temporary files left behind after cleanup failed",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Tasks
        Box::new(BATCHES_TOTAL.clone()),
        Box::new(TASKS_TOTAL.clone()),
        Box::new(TASK_DURATION.clone()),
        // Retrieval
        Box::new(ATTEMPTS_TOTAL.clone()),
        Box::new(RETRIEVALS_EXHAUSTED.clone()),
        // Relay
        Box::new(RELAYS_TOTAL.clone()),
        Box::new(RELAY_DURATION.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
    ]
}
