//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;
use crate::domain::{DecisionSource, ErrorKind, RouteCategory};

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .expect("uuid pattern is valid")
});

static NUMERIC_SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("numeric segment pattern is valid"));

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global recorder; `None` when disabled or already installed
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("semantic_search_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("semantic_cache_lookups_total", "outcome" => outcome).increment(1);
}

pub fn record_route_decision(source: DecisionSource, category: RouteCategory) {
    counter!(
        "router_decisions_total",
        "source" => source.as_str(),
        "category" => category.as_str()
    )
    .increment(1);
}

pub fn record_escalation(from: RouteCategory, to: RouteCategory) {
    counter!(
        "router_escalations_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_collaborator_error(collaborator: &'static str, kind: ErrorKind) {
    counter!(
        "collaborator_errors_total",
        "collaborator" => collaborator,
        "kind" => kind.as_str()
    )
    .increment(1);
}

/// `outcome` is `cached`, `answered` or an error kind
pub fn record_query(outcome: &str, duration: Duration) {
    let labels = [("outcome", outcome.to_string())];

    counter!("search_queries_total", &labels).increment(1);
    histogram!("search_query_duration_seconds", &labels).record(duration.as_secs_f64());
}

pub fn session_opened() {
    gauge!("active_sessions").increment(1.0);
}

pub fn session_closed() {
    gauge!("active_sessions").decrement(1.0);
}

/// Keep label cardinality bounded
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");
    let path = NUMERIC_SEGMENT.replace_all(&path, "/{id}$1");

    path.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_uuid() {
        let path = "/ws/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(sanitize_path(path), "/ws/{id}");
    }

    #[test]
    fn test_sanitize_path_numeric_id() {
        assert_eq!(sanitize_path("/api/cache/123/entries"), "/api/cache/{id}/entries");
    }

    #[test]
    fn test_sanitize_path_no_id() {
        assert_eq!(sanitize_path("/api/search/subquery"), "/api/search/subquery");
    }

    #[test]
    fn test_sanitize_path_truncates_long_paths() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert!(sanitize_path(path).len() <= 50);
    }

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        record_cache_lookup(true);
        record_route_decision(DecisionSource::Heuristic, RouteCategory::WebQuery);
        record_collaborator_error("qdrant", ErrorKind::RetrievalError);
        session_opened();
        session_closed();
    }
}
