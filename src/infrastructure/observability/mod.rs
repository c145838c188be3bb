//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    PrometheusMetrics, create_metrics_router, init_metrics, record_cache_lookup,
    record_collaborator_error, record_escalation, record_http_request, record_query,
    record_route_decision, session_closed, session_opened,
};
