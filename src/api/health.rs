//! Health check endpoints for container orchestrators

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// One component's health
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Liveness with version; never touches collaborators
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness: the cache is loaded and the document index answers.
///
/// An unreachable index still serves web-only answers, so it degrades
/// readiness instead of failing it.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let checks = vec![check_semantic_cache(&state), check_document_index(&state).await];

    let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    (StatusCode::OK, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn check_semantic_cache(state: &AppState) -> HealthCheck {
    let stats = state.cache.stats();

    HealthCheck {
        name: "semantic_cache".to_string(),
        status: HealthStatus::Healthy,
        message: Some(format!(
            "{} entries in {}",
            stats.entry_count, stats.backing_store
        )),
        latency_ms: None,
    }
}

async fn check_document_index(state: &AppState) -> HealthCheck {
    let start = Instant::now();

    let (status, message) = match state.index.health_check().await {
        Ok(true) => (HealthStatus::Healthy, None),
        Ok(false) => (
            HealthStatus::Unhealthy,
            Some("index reported unhealthy".to_string()),
        ),
        Err(e) => (HealthStatus::Unhealthy, Some(e.to_string())),
    };

    HealthCheck {
        name: "document_index".to_string(),
        status,
        message,
        latency_ms: Some(start.elapsed().as_millis() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::test_state;
    use crate::domain::DomainError;
    use crate::domain::llm::MockLlmProvider;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[test]
    fn test_health_response_skips_empty_checks() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("checks"));
    }

    #[tokio::test]
    async fn test_ready_with_healthy_index() {
        let (state, _) = test_state(MockLlmProvider::new(), || Ok(true)).await;

        let cache = check_semantic_cache(&state);
        let index = check_document_index(&state).await;

        assert_eq!(cache.status, HealthStatus::Healthy);
        assert_eq!(cache.message.as_deref(), Some("0 entries in memory"));
        assert_eq!(index.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_unreachable_index_is_unhealthy() {
        let (state, _) = test_state(MockLlmProvider::new(), || {
            Err(DomainError::retrieval("qdrant", "connection refused"))
        })
        .await;

        let index = check_document_index(&state).await;

        assert_eq!(index.status, HealthStatus::Unhealthy);
        assert!(index.message.unwrap().contains("connection refused"));
    }
}
