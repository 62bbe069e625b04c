//! Prometheus metrics for relnotes-fn

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::Result;
use crate::error::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

// Server metrics
const METRIC_UPTIME: &str = "relnotes_uptime_seconds";
const METRIC_INFO: &str = "relnotes_info";
const METRIC_REQUESTS: &str = "relnotes_requests_total";

// Lookup metrics
const METRIC_FETCH_DURATION: &str = "relnotes_fetch_duration_seconds";
const METRIC_FETCH_TOTAL: &str = "relnotes_fetches_total";
const METRIC_FETCH_ERRORS: &str = "relnotes_fetch_errors_total";
const METRIC_ROWS: &str = "relnotes_rows_total";

/// Initialize Prometheus metrics recorder.
pub fn init_metrics() -> Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("Failed to install metrics recorder: {e}")))?;

    PROMETHEUS_HANDLE.set(handle).ok();
    START_TIME.set(Instant::now()).ok();

    register_metrics();
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

fn register_metrics() {
    describe_gauge!(METRIC_UPTIME, "Server uptime in seconds");
    describe_gauge!(METRIC_INFO, "Server information (always 1)");
    describe_counter!(METRIC_REQUESTS, "Total lookup requests received");

    describe_histogram!(METRIC_FETCH_DURATION, "Lookup duration in seconds");
    describe_counter!(METRIC_FETCH_TOTAL, "Total lookups run against BigQuery");
    describe_counter!(METRIC_FETCH_ERRORS, "Total failed lookups by error kind");
    describe_counter!(METRIC_ROWS, "Total release notes returned");

    gauge!(
        METRIC_INFO,
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);
}

/// Render metrics in Prometheus text format.
#[must_use]
pub fn render_metrics() -> String {
    if let Some(start) = START_TIME.get() {
        gauge!(METRIC_UPTIME).set(start.elapsed().as_secs_f64());
    }

    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record an inbound lookup request.
pub fn record_request(route: &str) {
    counter!(METRIC_REQUESTS, "route" => route.to_owned()).increment(1);
}

/// Record a completed lookup.
pub fn record_fetch(duration: Duration, row_count: u64) {
    histogram!(METRIC_FETCH_DURATION, "status" => "success").record(duration.as_secs_f64());
    counter!(METRIC_FETCH_TOTAL, "status" => "success").increment(1);
    counter!(METRIC_ROWS).increment(row_count);
}

/// Record a failed lookup.
pub fn record_fetch_error(kind: &str) {
    counter!(METRIC_FETCH_ERRORS, "kind" => kind.to_owned()).increment(1);
    counter!(METRIC_FETCH_TOTAL, "status" => "error").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_metrics_without_init() {
        let output = render_metrics();
        assert!(output.is_empty());
    }

    #[test]
    fn test_record_without_recorder_is_noop() {
        record_request("/");
        record_fetch(Duration::from_millis(5), 3);
        record_fetch_error("decode");
    }
}
