use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::v1;
use super::ws;
use crate::config::ServerConfig;

/// Full application router.
///
/// `metrics` is the already-built `/metrics` router, merged after state is
/// applied. A configured `static_dir` serves the frontend for unmatched paths.
pub fn create_router(state: AppState, server: &ServerConfig, metrics: Option<Router>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .route("/ws", get(ws::ws_handler))
        .nest("/api", v1::create_api_router())
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.merge(metrics);
    }

    if let Some(dir) = server.static_dir.as_deref().filter(|d| !d.is_empty()) {
        info!(dir = %dir, "Serving static frontend");
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Permissive when no origins are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
