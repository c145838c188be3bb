use serde::{Deserialize, Serialize};

use super::RouteCategory;

/// How a decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    Model,
    Heuristic,
    Default,
}

impl DecisionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Heuristic => "heuristic",
            Self::Default => "default",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    pub category: RouteCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub source: DecisionSource,
}

impl RouteDecision {
    pub fn new(category: RouteCategory, source: DecisionSource) -> Self {
        Self {
            category,
            confidence: None,
            rationale: None,
            source,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        let rationale = rationale.into();
        if !rationale.trim().is_empty() {
            self.rationale = Some(rationale);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_rationale_is_dropped() {
        let decision = RouteDecision::new(RouteCategory::WebQuery, DecisionSource::Model)
            .with_rationale("   ")
            .with_confidence(1.4);

        assert!(decision.rationale.is_none());
        assert_eq!(decision.confidence, Some(1.0));
    }
}
