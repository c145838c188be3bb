use crate::domain::DomainError;
use crate::domain::retrieval::QueryOptions;

pub const MAX_QUERY_CHARS: usize = 1000;

/// A validated question plus the options it was asked with
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    text: String,
    options: QueryOptions,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, options: QueryOptions) -> Result<Self, DomainError> {
        let text = text.into().trim().to_string();

        if text.is_empty() {
            return Err(DomainError::validation("Query must not be empty"));
        }

        let length = text.chars().count();
        if length > MAX_QUERY_CHARS {
            return Err(DomainError::validation(format!(
                "Query is {} characters long (maximum {})",
                length, MAX_QUERY_CHARS
            )));
        }

        Ok(Self { text, options })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }
}
