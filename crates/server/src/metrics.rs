//! Prometheus metrics for the HTTP surface.
//!
//! HTTP request metrics live here; pipeline metrics come from the core crate
//! and are registered into the same registry. Gauges that mirror application
//! state (orchestrator, queue, schedule) are refreshed on each scrape.

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

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipforge_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipforge_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipforge_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "clipforge_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

/// Orchestrator running state (1 = running, 0 = stopped).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipforge_orchestrator_running",
        "Whether the orchestrator is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Queue records pending production (collected dynamically).
pub static QUEUE_PENDING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipforge_queue_pending",
        "Production records waiting in the queue",
    )
    .unwrap()
});

/// Schedule entries waiting for upload (collected dynamically).
pub static SCHEDULE_WAITING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipforge_schedule_waiting",
        "Schedule entries not yet uploaded",
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(QUEUE_PENDING.clone())).unwrap();
    registry
        .register(Box::new(SCHEDULE_WAITING.clone()))
        .unwrap();

    // Core metrics (curation, synthesis, delivery)
    for metric in clipforge_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Refresh gauges that mirror application state. Called before each scrape.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    use clipforge_core::queue::ProductionStatus;

    match state.orchestrator() {
        Some(orchestrator) => {
            ORCHESTRATOR_RUNNING.set(if orchestrator.status().running { 1 } else { 0 });
        }
        None => ORCHESTRATOR_RUNNING.set(0),
    }

    if let Ok(pending) = state.queue().count_by_status(ProductionStatus::Pending) {
        QUEUE_PENDING.set(pending as i64);
    }

    if let Ok(times) = state.schedule().scheduled_times() {
        SCHEDULE_WAITING.set(times.len() as i64);
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();
    let file_regex = regex_lite::Regex::new(r"/videos/[^/]+$").unwrap();

    let result = file_regex.replace_all(path, "/videos/{name}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/produce/42"), "/api/produce/{id}");
    }

    #[test]
    fn test_normalize_path_video_name() {
        assert_eq!(normalize_path("/api/videos/17"), "/api/videos/{name}");
        assert_eq!(normalize_path("/api/videos"), "/api/videos");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/health"), "/api/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("clipforge_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }
}
