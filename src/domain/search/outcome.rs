use serde::{Deserialize, Serialize};

use crate::domain::ErrorKind;
use crate::domain::retrieval::SourceRef;
use crate::domain::routing::RouteCategory;

/// Why a sub-question produced no answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQueryFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-slot result of a decomposed question, kept in decomposition order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQueryReport {
    pub index: usize,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<RouteCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<SubQueryFailure>,
}

impl SubQueryReport {
    pub fn answered(
        index: usize,
        question: impl Into<String>,
        category: RouteCategory,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            index,
            question: question.into(),
            category: Some(category),
            answer: Some(answer.into()),
            failure: None,
        }
    }

    pub fn failed(
        index: usize,
        question: impl Into<String>,
        category: Option<RouteCategory>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            index,
            question: question.into(),
            category,
            answer: None,
            failure: Some(SubQueryFailure {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// The slot's answer, or an explicit marker naming what went wrong
    pub fn rendered_answer(&self) -> String {
        match (&self.answer, &self.failure) {
            (_, Some(failure)) => format!("[unavailable: {}] {}", failure.kind, failure.message),
            (Some(answer), None) => answer.clone(),
            (None, None) => String::new(),
        }
    }
}

/// What the orchestrator hands back for one question
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOutcome {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// Category used for caching; the classified one, or the dominant one across sub-questions
    pub category: RouteCategory,
    /// Evidence was narrower than the category asked for
    pub degraded: bool,
    /// A filing question fell through to the web
    pub escalated: bool,
    pub sub_queries: Vec<SubQueryReport>,
}

impl RetrievalOutcome {
    pub fn new(answer: impl Into<String>, sources: Vec<SourceRef>, category: RouteCategory) -> Self {
        Self {
            answer: answer.into(),
            sources,
            category,
            degraded: false,
            escalated: false,
            sub_queries: Vec::new(),
        }
    }

    /// Whether the answer is complete enough to serve again from cache
    pub fn is_cacheable(&self) -> bool {
        !self.degraded && !self.sub_queries.iter().any(SubQueryReport::is_failed)
    }
}
