//! Qdrant REST adapter for the filing and API-doc collections

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DocumentIndex, DomainError, IndexMatch};
use crate::infrastructure::http_client::HttpClientTrait;

/// Payload keys tried, in order, for the chunk text
const CONTENT_KEYS: &[&str] = &["content", "text", "page_content"];

#[derive(Debug)]
pub struct QdrantDocumentIndex<C: HttpClientTrait> {
    client: C,
    base_url: String,
    api_key: Option<String>,
}

impl<C: HttpClientTrait> QdrantDocumentIndex<C> {
    pub fn new(client: C, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    fn search_url(&self, collection: &str) -> String {
        format!("{}/collections/{}/points/search", self.base_url, collection)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        let mut headers = vec![("Content-Type", "application/json")];

        if let Some(ref key) = self.api_key {
            headers.push(("api-key", key.as_str()));
        }

        headers
    }
}

fn payload_to_match(point: QdrantPoint) -> IndexMatch {
    let mut content = String::new();
    let mut metadata = HashMap::new();

    for (key, value) in point.payload {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => continue,
            other => other.to_string(),
        };

        if content.is_empty() && CONTENT_KEYS.contains(&key.as_str()) {
            content = text;
        } else {
            metadata.insert(key, text);
        }
    }

    let point_id = match point.id {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    };
    metadata.insert("point_id".to_string(), point_id);

    IndexMatch {
        content,
        score: point.score,
        metadata,
    }
}

#[async_trait]
impl<C: HttpClientTrait> DocumentIndex for QdrantDocumentIndex<C> {
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, DomainError> {
        let body = serde_json::json!({
            "vector": embedding,
            "limit": top_k,
            "with_payload": true,
        });

        let response = self
            .client
            .post_json(&self.search_url(collection), self.headers(), &body)
            .await
            .map_err(|e| DomainError::retrieval("qdrant", e.detail()))?;

        let parsed: QdrantSearchResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::retrieval("qdrant", format!("Failed to parse search response: {}", e))
        })?;

        let mut matches: Vec<IndexMatch> = parsed.result.into_iter().map(payload_to_match).collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);

        debug!(collection = %collection, matches = matches.len(), "Qdrant search completed");

        Ok(matches)
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        let url = format!("{}/collections", self.base_url);

        match self.client.get_json(&url, self.headers()).await {
            Ok(_) => Ok(true),
            Err(e) => {
                debug!(error = %e, "Qdrant health check failed");
                Ok(false)
            }
        }
    }

    fn index_name(&self) -> &'static str {
        "qdrant"
    }
}

#[derive(Debug, Deserialize)]
struct QdrantSearchResponse {
    #[serde(default)]
    result: Vec<QdrantPoint>,
}

#[derive(Debug, Deserialize)]
struct QdrantPoint {
    id: serde_json::Value,
    score: f32,
    #[serde(default)]
    payload: serde_json::Map<String, serde_json::Value>,
}
