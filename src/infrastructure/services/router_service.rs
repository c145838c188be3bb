//! Query router: category classification and sub-question decomposition

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, error, warn};

use super::completion_gateway::CompletionGateway;
use crate::domain::{
    DecisionSource, DomainError, KeywordHeuristic, LlmRequest, ResponseFormat, RouteCategory,
    RouteDecision, RouterConfig,
};
use crate::infrastructure::observability::record_route_decision;

/// Sub-questions this short are dropped as noise
const MIN_SUB_QUESTION_CHARS: usize = 10;

#[derive(Debug)]
pub struct RouterService {
    completion: Arc<CompletionGateway>,
    heuristic: KeywordHeuristic,
    config: RouterConfig,
}

#[derive(Debug, Deserialize)]
struct ClassificationReply {
    #[serde(alias = "action", alias = "query_type")]
    category: String,
    #[serde(default, alias = "rationale")]
    reason: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct DecompositionReply {
    #[serde(alias = "sub_questions", alias = "questions")]
    #[serde(rename = "subQuestions")]
    sub_questions: Vec<String>,
}

/// Extract the outermost JSON object from a reply (tolerates markdown fences)
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn classification_prompt() -> String {
    let taxonomy = RouteCategory::ALL
        .iter()
        .map(|c| format!("- {}: {}", c.as_str(), c.description()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You route user questions to the knowledge source that can answer them.\n\
         Categories:\n{}\n\n\
         Respond with a JSON object: {{\"category\": \"<CATEGORY>\", \"reason\": \"<short reason>\", \"confidence\": <0..1>}}",
        taxonomy
    )
}

const DECOMPOSITION_PROMPT: &str = "Break the user's question into simpler, self-contained sub-questions \
that can each be answered independently. Keep company names, years and other specifics in every \
sub-question. If the question is already simple, return it unchanged as the only element.\n\
Respond with a JSON object: {\"subQuestions\": [\"...\", \"...\"]}";

impl RouterService {
    pub fn new(completion: Arc<CompletionGateway>, config: RouterConfig) -> Result<Self, DomainError> {
        Ok(Self {
            completion,
            heuristic: KeywordHeuristic::new(&config)?,
            config,
        })
    }

    /// Parse a model reply into a decision; `None` when no valid category is present
    fn parse_decision(reply: &str) -> Option<RouteDecision> {
        let parsed = extract_json(reply)
            .and_then(|json| serde_json::from_str::<ClassificationReply>(json).ok());

        if let Some(parsed) = parsed {
            let category = RouteCategory::parse_token(&parsed.category)?;
            let mut decision = RouteDecision::new(category, DecisionSource::Model)
                .with_rationale(parsed.reason.unwrap_or_default());
            if let Some(confidence) = parsed.confidence {
                decision = decision.with_confidence(confidence);
            }
            return Some(decision);
        }

        // some models answer with the bare token
        RouteCategory::parse_token(reply).map(|c| RouteDecision::new(c, DecisionSource::Model))
    }

    /// Pick the knowledge source for `question`.
    ///
    /// Never fails: an unusable model reply falls back to the keyword
    /// heuristic, and an unclassifiable question defaults to the web.
    pub async fn classify(&self, question: &str) -> RouteDecision {
        let request = LlmRequest::builder()
            .system(classification_prompt())
            .user(format!("Question to classify: {}", question))
            .temperature(self.config.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build();

        let model_decision = match self.completion.complete(&self.config.model, request).await {
            Ok(reply) => {
                let decision = Self::parse_decision(&reply);
                if decision.is_none() {
                    warn!(reply = %reply, "Router reply has no valid category");
                }
                decision
            }
            Err(e) => {
                warn!(error = %e, "Router model unavailable");
                None
            }
        };

        let decision = match model_decision {
            Some(decision) => decision,
            None => match self.heuristic.classify(question) {
                Ok(category) => RouteDecision::new(category, DecisionSource::Heuristic)
                    .with_rationale("keyword fallback"),
                Err(e) => {
                    error!(error = %e, "Unclassifiable query; defaulting to web search");
                    RouteDecision::new(RouteCategory::WebQuery, DecisionSource::Default)
                        .with_rationale(e.detail())
                }
            },
        };

        record_route_decision(decision.source, decision.category);
        debug!(
            category = %decision.category,
            source = decision.source.as_str(),
            "Query routed"
        );

        decision
    }

    /// Split `question` into independent sub-questions.
    ///
    /// Any failure, or a reply with nothing usable, yields the question itself.
    pub async fn decompose(&self, question: &str) -> Vec<String> {
        let request = LlmRequest::builder()
            .system(DECOMPOSITION_PROMPT)
            .user(format!("Question to decompose: {}", question))
            .temperature(self.config.temperature)
            .response_format(ResponseFormat::JsonObject)
            .build();

        let reply = match self.completion.complete(&self.config.model, request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Decomposition failed; answering the question whole");
                return vec![question.to_string()];
            }
        };

        let parsed = extract_json(&reply)
            .and_then(|json| serde_json::from_str::<DecompositionReply>(json).ok())
            .map(|r| r.sub_questions)
            .unwrap_or_default();

        let sub_questions: Vec<String> = parsed
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| q.chars().count() > MIN_SUB_QUESTION_CHARS)
            .collect();

        if sub_questions.is_empty() {
            warn!(reply = %reply, "Decomposition reply unusable; answering the question whole");
            return vec![question.to_string()];
        }

        debug!(count = sub_questions.len(), "Question decomposed");
        sub_questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::llm::MockLlmProvider;

    fn router(provider: MockLlmProvider) -> RouterService {
        let completion = CompletionGateway::new(Arc::new(provider), Duration::from_secs(1));
        RouterService::new(Arc::new(completion), RouterConfig::default()).unwrap()
    }

    #[test]
    fn test_extract_json() {
        assert_eq!(extract_json("```json\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(extract_json("no json"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[tokio::test]
    async fn test_model_decision() {
        let router = router(MockLlmProvider::new().on(
            "Question to classify: What was Uber",
            r#"{"category":"DOCUMENT_QUERY","reason":"10-K financials","confidence":0.92}"#,
        ));

        let decision = router.classify("What was Uber's revenue in 2021?").await;

        assert_eq!(decision.category, RouteCategory::DocumentQuery);
        assert_eq!(decision.source, DecisionSource::Model);
        assert_eq!(decision.rationale.as_deref(), Some("10-K financials"));
        assert_eq!(decision.confidence, Some(0.92));
    }

    #[tokio::test]
    async fn test_legacy_action_field_and_alias() {
        let router = router(MockLlmProvider::new().with_fallback(r#"{"action":"OPENAI_QUERY"}"#));

        let decision = router.classify("How do embeddings work?").await;
        assert_eq!(decision.category, RouteCategory::ApiDocQuery);
        assert_eq!(decision.source, DecisionSource::Model);
    }

    #[tokio::test]
    async fn test_bare_token_reply() {
        let router = router(MockLlmProvider::new().with_fallback("WEB_QUERY"));
        let decision = router.classify("Top leadership styles").await;

        assert_eq!(decision.category, RouteCategory::WebQuery);
        assert_eq!(decision.source, DecisionSource::Model);
    }

    #[tokio::test]
    async fn test_unknown_category_falls_back_to_heuristic() {
        let router = router(MockLlmProvider::new().with_fallback(r#"{"category":"SPORTS_QUERY"}"#));
        let decision = router.classify("What was Uber's revenue in 2021?").await;

        assert_eq!(decision.category, RouteCategory::DocumentQuery);
        assert_eq!(decision.source, DecisionSource::Heuristic);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_heuristic() {
        let router = router(MockLlmProvider::new().with_error("rate limited"));
        let decision = router.classify("How do I call the OpenAI embeddings API?").await;

        assert_eq!(decision.category, RouteCategory::ApiDocQuery);
        assert_eq!(decision.source, DecisionSource::Heuristic);
    }

    #[tokio::test]
    async fn test_unclassifiable_defaults_to_web() {
        let router = router(MockLlmProvider::new().with_fallback("I cannot tell"));
        let decision = router.classify("???").await;

        assert_eq!(decision.category, RouteCategory::WebQuery);
        assert_eq!(decision.source, DecisionSource::Default);
    }

    #[tokio::test]
    async fn test_decompose() {
        let router = router(MockLlmProvider::new().on(
            "Question to decompose:",
            r#"{"subQuestions":["  What was Uber's revenue in 2021? ","short","What is the latest AI news?"]}"#,
        ));

        let parts = router
            .decompose("Compare Uber's 2021 revenue with the latest AI news")
            .await;

        assert_eq!(
            parts,
            vec![
                "What was Uber's revenue in 2021?".to_string(),
                "What is the latest AI news?".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_decompose_falls_back_to_question() {
        let question = "What was Uber's revenue in 2021?";

        let unusable = router(MockLlmProvider::new().with_fallback("sure! here you go"));
        assert_eq!(unusable.decompose(question).await, vec![question.to_string()]);

        let failing = router(MockLlmProvider::new().with_error("down"));
        assert_eq!(failing.decompose(question).await, vec![question.to_string()]);

        let empty = router(MockLlmProvider::new().with_fallback(r#"{"subQuestions":[]}"#));
        assert_eq!(empty.decompose(question).await, vec![question.to_string()]);
    }
}
