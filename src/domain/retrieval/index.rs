use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// A chunk returned by the document index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    pub content: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl IndexMatch {
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            score,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Vector index holding the filing and API-doc collections
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// Nearest chunks in `collection`, best first
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, DomainError>;

    /// Whether the index answers at all
    async fn health_check(&self) -> Result<bool, DomainError>;

    fn index_name(&self) -> &'static str;
}
