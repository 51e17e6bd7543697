//! Metrics module for subscription-service.
//! Provides Prometheus metrics for store access, usage logging and scoring.
//!
//! Service counters live in the `prometheus` default registry. HTTP request
//! metrics from `service_core::middleware::metrics` go through the `metrics`
//! facade and are rendered by the installed Prometheus recorder. `/metrics`
//! serves both.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "subscription_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Subscription CRUD operations counter
pub static SUBSCRIPTION_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Usage events logged
pub static USAGE_LOGGED_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Value tiers handed out by the scoring engine
pub static VALUE_SCORES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Dashboard rollups computed
pub static DASHBOARD_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Recorder behind the `metrics` facade. `None` if another recorder was
/// already installed in this process.
pub static HTTP_METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Initialize all metrics. Safe to call more than once.
pub fn init_metrics() {
    SUBSCRIPTION_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "subscription_operations_total",
                "Total subscription operations by operation type"
            ),
            &["operation"]
        )
        .expect("Failed to register SUBSCRIPTION_OPERATIONS_TOTAL")
    });

    USAGE_LOGGED_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("subscription_usage_logged_total", "Total usage events logged"),
            &["backend"]
        )
        .expect("Failed to register USAGE_LOGGED_TOTAL")
    });

    VALUE_SCORES_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "subscription_value_scores_total",
                "Scored subscriptions by value tier"
            ),
            &["value_score"]
        )
        .expect("Failed to register VALUE_SCORES_TOTAL")
    });

    DASHBOARD_REQUESTS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "subscription_dashboard_requests_total",
                "Dashboard rollups by outcome"
            ),
            &["status"]
        )
        .expect("Failed to register DASHBOARD_REQUESTS_TOTAL")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "subscription_errors_total",
                "Total errors by type for alerting"
            ),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    HTTP_METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder for HTTP metrics");
            None
        }
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    let mut output = String::from_utf8(buffer).unwrap_or_default();

    if let Some(Some(handle)) = HTTP_METRICS_HANDLE.get() {
        output.push_str(&handle.render());
    }
    output
}

/// Record a subscription operation.
pub fn record_subscription_operation(operation: &str) {
    if let Some(counter) = SUBSCRIPTION_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}

/// Record a logged usage event.
pub fn record_usage_logged(backend: &str) {
    if let Some(counter) = USAGE_LOGGED_TOTAL.get() {
        counter.with_label_values(&[backend]).inc();
    }
}

/// Record the tier assigned to a scored subscription.
pub fn record_value_score(value_score: &str) {
    if let Some(counter) = VALUE_SCORES_TOTAL.get() {
        counter.with_label_values(&[value_score]).inc();
    }
}

/// Record a dashboard rollup.
pub fn record_dashboard_request(status: &str) {
    if let Some(counter) = DASHBOARD_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
