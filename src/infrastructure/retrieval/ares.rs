//! ARES live-search adapter

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::{DomainError, WebResult, WebSearchProvider};
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_ARES_URL: &str = "https://api-ares.traversaal.ai/live/predict";

#[derive(Debug)]
pub struct AresWebSearch<C: HttpClientTrait> {
    client: C,
    url: String,
    api_key: String,
}

impl<C: HttpClientTrait> AresWebSearch<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_url(client, api_key, DEFAULT_ARES_URL)
    }

    pub fn with_url(client: C, api_key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> WebSearchProvider for AresWebSearch<C> {
    async fn search(&self, query: &str) -> Result<Vec<WebResult>, DomainError> {
        let body = serde_json::json!({ "query": [query] });
        let headers = vec![
            ("x-api-key", self.api_key.as_str()),
            ("Content-Type", "application/json"),
        ];

        let response = self
            .client
            .post_json(&self.url, headers, &body)
            .await
            .map_err(|e| DomainError::retrieval("ares", e.detail()))?;

        let parsed: AresResponse = serde_json::from_value(response).map_err(|e| {
            DomainError::retrieval("ares", format!("Failed to parse response: {}", e))
        })?;

        let Some(data) = parsed.data else {
            return Ok(Vec::new());
        };

        let text = data.response_text.unwrap_or_default();
        if text.trim().is_empty() {
            debug!(query = %query, "ARES returned no text");
            return Ok(Vec::new());
        }

        let mut result = WebResult::new(text)
            .with_metadata("source", "ares_api")
            .with_metadata("search_query", query);

        if !data.web_url.is_empty() {
            result = result.with_metadata("web_url", data.web_url.join(", "));
        }

        Ok(vec![result])
    }

    fn provider_name(&self) -> &'static str {
        "ares"
    }
}

#[derive(Debug, Deserialize)]
struct AresResponse {
    data: Option<AresData>,
}

#[derive(Debug, Deserialize)]
struct AresData {
    response_text: Option<String>,
    #[serde(default)]
    web_url: Vec<String>,
}
