//! Deterministic keyword classifier used when the model cannot decide

use regex::Regex;

use super::{RouteCategory, RouterConfig};
use crate::domain::DomainError;

/// Whole-word, case-insensitive vocabulary matcher
#[derive(Debug, Clone)]
pub struct KeywordHeuristic {
    document: Option<Regex>,
    api: Option<Regex>,
}

fn vocabulary_pattern(terms: &[String]) -> Result<Option<Regex>, DomainError> {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();

    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));

    Regex::new(&pattern)
        .map(Some)
        .map_err(|e| DomainError::configuration(format!("Invalid router vocabulary: {}", e)))
}

impl KeywordHeuristic {
    pub fn new(config: &RouterConfig) -> Result<Self, DomainError> {
        Ok(Self {
            document: vocabulary_pattern(&config.document_terms)?,
            api: vocabulary_pattern(&config.api_terms)?,
        })
    }

    fn hits(pattern: &Option<Regex>, text: &str) -> usize {
        pattern
            .as_ref()
            .map(|re| re.find_iter(text).count())
            .unwrap_or(0)
    }

    /// Classify by vocabulary hits. Filing vocabulary wins ties.
    ///
    /// Fails only when the text has nothing to classify.
    pub fn classify(&self, question: &str) -> Result<RouteCategory, DomainError> {
        if !question.chars().any(char::is_alphanumeric) {
            return Err(DomainError::unclassifiable(format!(
                "no words to classify in '{}'",
                question
            )));
        }

        let document_hits = Self::hits(&self.document, question);
        let api_hits = Self::hits(&self.api, question);

        let category = if api_hits > document_hits {
            RouteCategory::ApiDocQuery
        } else if document_hits > 0 {
            RouteCategory::DocumentQuery
        } else {
            RouteCategory::WebQuery
        };

        Ok(category)
    }
}
