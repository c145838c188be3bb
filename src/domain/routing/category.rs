use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// The knowledge source a question should be answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteCategory {
    /// Annual-report (10-K) filings
    DocumentQuery,
    /// Model-provider API documentation
    ApiDocQuery,
    /// Anything else; answered from the open web
    WebQuery,
}

impl RouteCategory {
    pub const ALL: [RouteCategory; 3] = [Self::DocumentQuery, Self::ApiDocQuery, Self::WebQuery];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocumentQuery => "DOCUMENT_QUERY",
            Self::ApiDocQuery => "API_DOC_QUERY",
            Self::WebQuery => "WEB_QUERY",
        }
    }

    /// One-line description used when presenting the taxonomy to a model
    pub fn description(&self) -> &'static str {
        match self {
            Self::DocumentQuery => {
                "questions about company annual reports (10-K filings): revenue, income, risk factors, segments, guidance"
            }
            Self::ApiDocQuery => {
                "questions answerable from OpenAI's official documentation: models, APIs, embeddings, fine-tuning, usage guidelines"
            }
            Self::WebQuery => {
                "everything else, including news, trends, comparisons across providers and other current information"
            }
        }
    }

    /// Parse a category token, accepting the legacy taxonomy names
    pub fn parse_token(token: &str) -> Option<Self> {
        let normalized = token
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.')
            .to_ascii_uppercase()
            .replace(['-', ' '], "_");

        match normalized.as_str() {
            "DOCUMENT_QUERY" | "10K_DOCUMENT_QUERY" | "DOCUMENT_10K_QUERY" => {
                Some(Self::DocumentQuery)
            }
            "API_DOC_QUERY" | "OPENAI_QUERY" => Some(Self::ApiDocQuery),
            "WEB_QUERY" | "INTERNET_QUERY" => Some(Self::WebQuery),
            _ => None,
        }
    }
}

impl fmt::Display for RouteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_token(s)
            .ok_or_else(|| DomainError::validation(format!("Unknown route category '{}'", s)))
    }
}
