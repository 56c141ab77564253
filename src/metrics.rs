//! Prometheus metrics for upstream latency and request outcomes.
//!
//! This module provides metrics for:
//! - Upstream call latency (token endpoint, Meet API, demo API)
//! - Spaces created and failed
//! - OAuth logins and service account tokens minted

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::debug;

// === Metric Name Constants ===

/// Upstream request latency metric name.
pub const METRIC_UPSTREAM_LATENCY: &str = "upstream_request_latency_ms";
/// Spaces created counter metric name.
pub const METRIC_SPACES_CREATED: &str = "spaces_created_total";
/// Space creation failures counter metric name.
pub const METRIC_SPACES_FAILED: &str = "spaces_failed_total";
/// Completed OAuth logins counter metric name.
pub const METRIC_OAUTH_LOGINS: &str = "oauth_logins_total";
/// Service account tokens minted counter metric name.
pub const METRIC_SERVICE_ACCOUNT_TOKENS: &str = "service_account_tokens_total";
/// Demo API calls counter metric name.
pub const METRIC_DEMO_REQUESTS: &str = "demo_requests_total";

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder once per process and return its handle.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PROMETHEUS
        .get_or_try_init(|| PrometheusBuilder::new().install_recorder())
        .cloned()
}

/// Initialize all metric descriptions.
/// Call this once at startup, after installing the recorder.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_UPSTREAM_LATENCY,
        "Latency of calls to Google and demo endpoints in milliseconds"
    );

    describe_counter!(METRIC_SPACES_CREATED, "Total number of Meet spaces created");
    describe_counter!(
        METRIC_SPACES_FAILED,
        "Total number of Meet space creations rejected by the API"
    );
    describe_counter!(METRIC_OAUTH_LOGINS, "Total number of completed OAuth code exchanges");
    describe_counter!(
        METRIC_SERVICE_ACCOUNT_TOKENS,
        "Total number of service account access tokens minted"
    );
    describe_counter!(METRIC_DEMO_REQUESTS, "Total number of demo API calls");

    debug!("Metrics initialized");
}

/// Increment spaces created counter.
pub fn inc_spaces_created() {
    counter!(METRIC_SPACES_CREATED).increment(1);
}

/// Increment spaces failed counter.
pub fn inc_spaces_failed() {
    counter!(METRIC_SPACES_FAILED).increment(1);
}

/// Increment OAuth logins counter.
pub fn inc_oauth_logins() {
    counter!(METRIC_OAUTH_LOGINS).increment(1);
}

/// Increment service account tokens counter.
pub fn inc_service_account_tokens() {
    counter!(METRIC_SERVICE_ACCOUNT_TOKENS).increment(1);
}

/// Increment demo requests counter.
pub fn inc_demo_requests() {
    counter!(METRIC_DEMO_REQUESTS).increment(1);
}

/// RAII guard for timing upstream calls.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    upstream: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer labelled with the upstream name.
    pub fn new(upstream: &'static str) -> Self {
        Self {
            start: Instant::now(),
            upstream,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(METRIC_UPSTREAM_LATENCY, "upstream" => self.upstream).record(self.elapsed_ms());
    }
}

/// Create a latency timer for an upstream call.
pub fn timer_upstream(upstream: &'static str) -> LatencyTimer {
    LatencyTimer::new(upstream)
}
