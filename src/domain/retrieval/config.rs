//! Retrieval configuration

use serde::{Deserialize, Serialize};

/// Knobs for evidence gathering and answer generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Matches requested from the document index per search
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Matches scoring below this never reach the model
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f32,

    /// Collection holding annual-report chunks
    #[serde(default = "default_document_collection")]
    pub document_collection: String,

    /// Collection holding API documentation chunks
    #[serde(default = "default_api_doc_collection")]
    pub api_doc_collection: String,

    /// Web passages kept as context
    #[serde(default = "default_max_web_results")]
    pub max_web_results: usize,

    #[serde(default = "default_answer_model")]
    pub answer_model: String,

    #[serde(default = "default_answer_temperature")]
    pub answer_temperature: f32,

    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: u32,
}

fn default_top_k() -> usize {
    5
}

fn default_min_relevance() -> f32 {
    0.3
}

fn default_document_collection() -> String {
    "10k_data".to_string()
}

fn default_api_doc_collection() -> String {
    "opnai_data".to_string()
}

fn default_max_web_results() -> usize {
    5
}

fn default_answer_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_answer_temperature() -> f32 {
    0.2
}

fn default_answer_max_tokens() -> u32 {
    1024
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_relevance: default_min_relevance(),
            document_collection: default_document_collection(),
            api_doc_collection: default_api_doc_collection(),
            max_web_results: default_max_web_results(),
            answer_model: default_answer_model(),
            answer_temperature: default_answer_temperature(),
            answer_max_tokens: default_answer_max_tokens(),
        }
    }
}

impl RetrievalConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = min_relevance.clamp(0.0, 1.0);
        self
    }

    pub fn with_collections(
        mut self,
        document_collection: impl Into<String>,
        api_doc_collection: impl Into<String>,
    ) -> Self {
        self.document_collection = document_collection.into();
        self.api_doc_collection = api_doc_collection.into();
        self
    }

    pub fn with_answer_model(mut self, model: impl Into<String>) -> Self {
        self.answer_model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetrievalConfig::default();

        assert_eq!(config.top_k, 5);
        assert!((config.min_relevance - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.document_collection, "10k_data");
        assert_eq!(config.api_doc_collection, "opnai_data");
    }

    #[test]
    fn test_builder_clamps() {
        let config = RetrievalConfig::default()
            .with_top_k(0)
            .with_min_relevance(1.7)
            .with_collections("filings", "docs");

        assert_eq!(config.top_k, 1);
        assert!((config.min_relevance - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.document_collection, "filings");
        assert_eq!(config.api_doc_collection, "docs");
    }
}
