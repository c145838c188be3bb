//! Cache inspection and maintenance

use axum::extract::State;

use crate::api::state::AppState;
use crate::api::types::{ApiError, CacheStatsResponse, ClearCacheResponse, Json};

/// GET /api/cache/stats
pub async fn stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(state.cache.stats().into())
}

/// DELETE /api/cache/clear
pub async fn clear(State(state): State<AppState>) -> Result<Json<ClearCacheResponse>, ApiError> {
    let cleared = state.cache.clear().await?;

    Ok(Json(ClearCacheResponse { cleared }))
}
