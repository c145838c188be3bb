//! Router configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Model used for classification and decomposition
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    /// Company names and filing vocabulary
    #[serde(default = "default_document_terms")]
    pub document_terms: Vec<String>,

    /// API and model-provider vocabulary
    #[serde(default = "default_api_terms")]
    pub api_terms: Vec<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_document_terms() -> Vec<String> {
    [
        "10-k", "10k", "annual report", "filing", "filings", "sec", "revenue", "revenues",
        "net income", "operating income", "earnings", "fiscal", "balance sheet", "cash flow",
        "risk factors", "shareholders", "uber", "lyft", "airbnb", "doordash", "apple",
        "microsoft", "amazon", "tesla", "alphabet", "meta",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_api_terms() -> Vec<String> {
    [
        "openai", "api", "endpoint", "gpt", "chatgpt", "embeddings", "embedding",
        "fine-tune", "fine-tuning", "moderation", "completions", "chat completions", "tokens",
        "rate limit", "rate limits", "assistants", "whisper", "dall-e",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: 0.0,
            document_terms: default_document_terms(),
            api_terms: default_api_terms(),
        }
    }
}

impl RouterConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_document_terms(mut self, terms: Vec<String>) -> Self {
        self.document_terms = terms;
        self
    }

    pub fn with_api_terms(mut self, terms: Vec<String>) -> Self {
        self.api_terms = terms;
        self
    }
}
