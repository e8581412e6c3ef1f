//! Prometheus metrics for observability.
//!
//! HTTP request metrics live here; scrape metrics come from
//! `scrapeyard_core::metrics` and are registered alongside them. A few
//! gauges are refreshed from application state on every scrape.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

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
            "scrapeyard_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scrapeyard_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "scrapeyard_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// State gauges (collected dynamically)
// =============================================================================

/// Scheduled loop state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "scrapeyard_orchestrator_running",
        "Whether the scrape loop is running (1) or stopped (0)",
    )
    .unwrap()
});

/// 1 while a run is in progress.
pub static SCRAPING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("scrapeyard_scraping", "Whether a scrape run is in progress").unwrap()
});

pub static CONTENT_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("scrapeyard_content_records", "Stored show and movie records").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // State
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(SCRAPING.clone())).unwrap();
    registry
        .register(Box::new(CONTENT_RECORDS.clone()))
        .unwrap();

    // Core metrics (parsing, items, runs)
    for metric in scrapeyard_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Refresh the state gauges before encoding.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Some(orchestrator) = state.orchestrator() {
        let status = orchestrator.status().await;
        ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
        SCRAPING.set(if status.scraping { 1 } else { 0 });
    }

    if let Ok(count) = state.store().count() {
        CONTENT_RECORDS.set(count as i64);
    }
}

static UUID_RE: Lazy<regex_lite::Regex> = Lazy::new(|| {
    regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap()
});

static NUMERIC_RE: Lazy<regex_lite::Regex> =
    Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    let result = UUID_RE.replace_all(path, "{id}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/api/v1/errors/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/api/v1/errors/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/content/42"), "/api/v1/content/{id}");
    }

    #[test]
    fn test_normalize_path_unchanged() {
        assert_eq!(normalize_path("/api/v1/status"), "/api/v1/status");
    }

    #[test]
    fn test_encode_includes_core_metrics() {
        scrapeyard_core::metrics::RUNS_TOTAL.inc();
        let text = encode_metrics();
        assert!(text.contains("scrapeyard_runs_total"));
        assert!(text.contains("scrapeyard_http_requests_in_flight"));
    }
}
