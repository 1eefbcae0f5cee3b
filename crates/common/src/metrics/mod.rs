//! Metrics and observability utilities
//!
//! Provides Prometheus metric registration with standardized naming
//! conventions for the workflow engine.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// Metrics prefix for all ReviewFlow metrics
pub const METRICS_PREFIX: &str = "reviewflow";

/// Histogram buckets for operation latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.025, // 25ms
    0.050, // 50ms
    0.100, // 100ms
    0.250, // 250ms
    0.500, // 500ms
    1.000, // 1s
    2.500, // 2.5s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Paper lifecycle metrics
    describe_counter!(
        format!("{}_papers_submitted_total", METRICS_PREFIX),
        Unit::Count,
        "Total papers submitted for review"
    );

    describe_counter!(
        format!("{}_papers_forked_total", METRICS_PREFIX),
        Unit::Count,
        "Total new paper versions created by forking"
    );

    describe_counter!(
        format!("{}_paper_decisions_total", METRICS_PREFIX),
        Unit::Count,
        "Total editorial decisions recorded"
    );

    // Assignment metrics
    describe_counter!(
        format!("{}_reviews_assigned_total", METRICS_PREFIX),
        Unit::Count,
        "Total reviewer assignments created"
    );

    describe_counter!(
        format!("{}_reviews_declined_total", METRICS_PREFIX),
        Unit::Count,
        "Total assignments declined by reviewers"
    );

    describe_counter!(
        format!("{}_assignment_conflicts_total", METRICS_PREFIX),
        Unit::Count,
        "Assignment attempts lost to a concurrent caller"
    );

    // Review lifecycle metrics
    describe_counter!(
        format!("{}_reviews_completed_total", METRICS_PREFIX),
        Unit::Count,
        "Total reviews submitted"
    );

    describe_gauge!(
        format!("{}_reviews_overdue", METRICS_PREFIX),
        Unit::Count,
        "Active reviews past their due date at last scan"
    );

    // Bibliometrics
    describe_counter!(
        format!("{}_citations_created_total", METRICS_PREFIX),
        Unit::Count,
        "Total citations created"
    );

    describe_counter!(
        format!("{}_citations_linked_total", METRICS_PREFIX),
        Unit::Count,
        "Total citation-to-paper links created"
    );

    // Reconciler
    describe_histogram!(
        format!("{}_reconcile_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Overdue-scan pass latency in seconds"
    );
}
