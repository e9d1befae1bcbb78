/// Metrics and telemetry for the identity service
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - DID resolutions by method and outcome
/// - Cache lookups by freshness
/// - Background revalidation results
/// - HTTP requests served

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder,
    HistogramVec, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // ========== Resolution Metrics ==========

    /// DID resolutions by method and outcome (found, not_found, or error kind)
    pub static ref DID_RESOLUTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "did_resolutions_total",
        "Total number of upstream DID resolutions",
        &["method", "outcome"]
    )
    .unwrap();

    /// Upstream resolution latency in seconds
    pub static ref DID_RESOLUTION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "did_resolution_duration_seconds",
        "Upstream DID resolution latencies in seconds",
        &["method"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // ========== Cache Metrics ==========

    /// Cache lookups by result (fresh, stale, expired, miss)
    pub static ref DID_CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "did_cache_lookups_total",
        "Total number of DID cache lookups",
        &["result"]
    )
    .unwrap();

    /// Background refreshes by status
    pub static ref DID_CACHE_REFRESHES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "did_cache_refreshes_total",
        "Total number of background DID cache refreshes",
        &["status"]
    )
    .unwrap();

    /// Number of entries in the DID cache
    pub static ref DID_CACHE_SIZE: IntGauge = register_int_gauge!(
        "did_cache_size",
        "Number of entries in the DID cache"
    )
    .unwrap();

    // ========== HTTP Metrics ==========

    /// HTTP requests by path and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["path", "status"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an upstream resolution
pub fn record_resolution(method: &str, outcome: &str, duration: f64) {
    DID_RESOLUTIONS_TOTAL
        .with_label_values(&[method, outcome])
        .inc();
    DID_RESOLUTION_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration);
}

/// Record a cache lookup
pub fn record_cache_lookup(result: &str) {
    DID_CACHE_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

/// Record a background refresh
pub fn record_cache_refresh(success: bool) {
    DID_CACHE_REFRESHES_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .inc();
}

/// Record an HTTP request
pub fn record_http_request(path: &str, status: u16) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[path, &status.to_string()])
        .inc();
}
