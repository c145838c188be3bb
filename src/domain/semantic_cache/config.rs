//! Semantic cache configuration

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Configuration for the semantic answer cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Snapshot file holding every cached entry
    #[serde(default = "default_file_path")]
    pub file_path: String,

    /// Similarity threshold for cache hits (0.0 to 1.0)
    /// Higher values require more similar questions
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Width every stored and probing embedding must have
    #[serde(default = "default_embedding_dimension")]
    pub embedding_dimension: usize,

    /// Upper bound on stored entries; unbounded when unset
    #[serde(default)]
    pub max_entries: Option<usize>,
}

fn default_file_path() -> String {
    "data/semantic_cache.json".to_string()
}

fn default_similarity_threshold() -> f32 {
    0.8
}

fn default_embedding_dimension() -> usize {
    768
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            file_path: default_file_path(),
            similarity_threshold: default_similarity_threshold(),
            embedding_dimension: default_embedding_dimension(),
            max_entries: None,
        }
    }
}

impl SemanticCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = path.into();
        self
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_embedding_dimension(mut self, dimension: usize) -> Self {
        self.embedding_dimension = dimension;
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max.max(1));
        self
    }

    /// Reject values the builders would have clamped but deserialization lets through
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DomainError::configuration(format!(
                "similarity_threshold must be within 0.0 and 1.0, got {}",
                self.similarity_threshold
            )));
        }
        if self.max_entries == Some(0) {
            return Err(DomainError::configuration("max_entries must be greater than zero"));
        }
        if self.embedding_dimension == 0 {
            return Err(DomainError::configuration("embedding_dimension must be greater than zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SemanticCacheConfig::default();

        assert!((config.similarity_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.embedding_dimension, 768);
        assert_eq!(config.max_entries, None);
        assert_eq!(config.file_path, "data/semantic_cache.json");
    }

    #[test]
    fn test_similarity_threshold_clamped() {
        let config = SemanticCacheConfig::new().with_similarity_threshold(1.5);
        assert!((config.similarity_threshold - 1.0).abs() < f32::EPSILON);

        let config = SemanticCacheConfig::new().with_similarity_threshold(-0.5);
        assert!(config.similarity_threshold.abs() < f32::EPSILON);
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let config: SemanticCacheConfig =
            serde_json::from_str(r#"{"similarity_threshold": 1.5}"#).unwrap();
        assert!(config.validate().is_err());

        let config: SemanticCacheConfig = serde_json::from_str(r#"{"max_entries": 0}"#).unwrap();
        assert!(config.validate().is_err());

        let config = SemanticCacheConfig { similarity_threshold: f32::NAN, ..Default::default() };
        assert!(config.validate().is_err());

        assert!(SemanticCacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_deserialization() {
        let config: SemanticCacheConfig =
            serde_json::from_str(r#"{"max_entries": 50, "embedding_dimension": 1536}"#).unwrap();

        assert_eq!(config.max_entries, Some(50));
        assert_eq!(config.embedding_dimension, 1536);
        assert!((config.similarity_threshold - 0.8).abs() < f32::EPSILON);
    }
}
