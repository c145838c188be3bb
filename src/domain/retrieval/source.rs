use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{IndexMatch, WebResult};

/// Where a piece of evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Document,
    Web,
}

/// Evidence attached to an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_type: SourceType,
    pub content_excerpt: String,
    /// Relevance reported by the collaborator; web results carry none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

const EXCERPT_CHARS: usize = 500;

fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}

impl SourceRef {
    pub fn from_match(m: &IndexMatch) -> Self {
        Self {
            source_type: SourceType::Document,
            content_excerpt: excerpt(&m.content),
            score: Some(m.score),
            metadata: m.metadata.clone(),
        }
    }

    pub fn from_web(result: &WebResult) -> Self {
        Self {
            source_type: SourceType::Web,
            content_excerpt: excerpt(&result.content),
            score: None,
            metadata: result.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(EXCERPT_CHARS + 10);
        let source = SourceRef::from_web(&WebResult::new(long));

        assert_eq!(source.content_excerpt.chars().count(), EXCERPT_CHARS + 3);
        assert!(source.content_excerpt.ends_with("..."));
        assert_eq!(source.source_type, SourceType::Web);
        assert!(source.score.is_none());
    }

    #[test]
    fn test_document_source_keeps_score_and_metadata() {
        let m = IndexMatch::new("Uber revenue was $17.4B", 0.91).with_metadata("company", "uber");
        let source = SourceRef::from_match(&m);

        assert_eq!(source.score, Some(0.91));
        assert_eq!(source.metadata.get("company").map(String::as_str), Some("uber"));
    }

    #[test]
    fn test_serialization_uses_lowercase_type() {
        let source = SourceRef::from_web(&WebResult::new("x"));
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["source_type"], "web");
        assert!(json.get("score").is_none());
    }
}
