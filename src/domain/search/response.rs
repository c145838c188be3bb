use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SubQueryReport;
use crate::domain::retrieval::SourceRef;
use crate::domain::routing::RouteCategory;

/// How the cache took part in answering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub hit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
    pub cache_size: usize,
    pub lookup_ms: u64,
}

/// Final answer for one query, as sent to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query_id: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub query_type: RouteCategory,
    pub cache_metrics: CacheMetrics,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default)]
    pub escalated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_queries: Vec<SubQueryReport>,
    pub processing_time_ms: u64,
    pub timestamp: DateTime<Utc>,
}
