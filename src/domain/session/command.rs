use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::retrieval::QueryOptions;

/// A client message, decoded from `{type, data}`
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    SearchQuery { query: String, options: QueryOptions },
    CacheStats,
    Ping,
    Cancel,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SearchQueryData {
    query: String,
    #[serde(flatten)]
    options: QueryOptions,
}

impl InboundCommand {
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let envelope: Envelope = serde_json::from_str(text)
            .map_err(|e| DomainError::validation(format!("Malformed message: {}", e)))?;

        let kind = envelope
            .kind
            .ok_or_else(|| DomainError::validation("Message has no type"))?;

        match kind.as_str() {
            "search_query" => {
                let data: SearchQueryData = serde_json::from_value(envelope.data).map_err(|e| {
                    DomainError::validation(format!("Invalid search_query payload: {}", e))
                })?;

                Ok(Self::SearchQuery {
                    query: data.query,
                    options: data.options,
                })
            }
            "cache_stats" => Ok(Self::CacheStats),
            "ping" => Ok(Self::Ping),
            "cancel" => Ok(Self::Cancel),
            other => Err(DomainError::validation(format!(
                "Unknown message type: {}",
                other
            ))),
        }
    }
}
