use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error classification carried in `error` events and API bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigError,
    EmbeddingError,
    GenerationError,
    RetrievalError,
    CollaboratorTimeout,
    CacheWriteDegraded,
    SessionBusyError,
    UnclassifiableQuery,
    ValidationError,
    QueryCancelled,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigError => "ConfigError",
            Self::EmbeddingError => "EmbeddingError",
            Self::GenerationError => "GenerationError",
            Self::RetrievalError => "RetrievalError",
            Self::CollaboratorTimeout => "CollaboratorTimeout",
            Self::CacheWriteDegraded => "CacheWriteDegraded",
            Self::SessionBusyError => "SessionBusyError",
            Self::UnclassifiableQuery => "UnclassifiableQuery",
            Self::ValidationError => "ValidationError",
            Self::QueryCancelled => "QueryCancelled",
            Self::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Embedding error: {message}")]
    Embedding { message: String },

    #[error("Generation error: {message}")]
    Generation { message: String },

    #[error("Retrieval error: {collaborator} - {message}")]
    Retrieval {
        collaborator: String,
        message: String,
    },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("{collaborator} did not answer within {timeout_ms}ms")]
    CollaboratorTimeout {
        collaborator: String,
        timeout_ms: u64,
    },

    #[error("Cache write degraded: {message}")]
    CacheWriteDegraded { message: String },

    #[error("Session {session_id} is busy with query {query_id}")]
    SessionBusy {
        session_id: String,
        query_id: String,
    },

    #[error("Unclassifiable query: {message}")]
    UnclassifiableQuery { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Query {query_id} was cancelled")]
    Cancelled { query_id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn retrieval(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Retrieval {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn timeout(collaborator: impl Into<String>, timeout_ms: u64) -> Self {
        Self::CollaboratorTimeout {
            collaborator: collaborator.into(),
            timeout_ms,
        }
    }

    pub fn cache_write_degraded(message: impl Into<String>) -> Self {
        Self::CacheWriteDegraded {
            message: message.into(),
        }
    }

    pub fn session_busy(session_id: impl Into<String>, query_id: impl Into<String>) -> Self {
        Self::SessionBusy {
            session_id: session_id.into(),
            query_id: query_id.into(),
        }
    }

    pub fn unclassifiable(message: impl Into<String>) -> Self {
        Self::UnclassifiableQuery {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn cancelled(query_id: impl Into<String>) -> Self {
        Self::Cancelled {
            query_id: query_id.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Classification exposed to clients.
    ///
    /// Raw transport failures should be re-tagged by the adapter that saw them;
    /// one that escapes untagged is reported as an internal error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::ConfigError,
            Self::Embedding { .. } => ErrorKind::EmbeddingError,
            Self::Generation { .. } => ErrorKind::GenerationError,
            Self::Retrieval { .. } => ErrorKind::RetrievalError,
            Self::CollaboratorTimeout { .. } => ErrorKind::CollaboratorTimeout,
            Self::CacheWriteDegraded { .. } => ErrorKind::CacheWriteDegraded,
            Self::SessionBusy { .. } => ErrorKind::SessionBusyError,
            Self::UnclassifiableQuery { .. } => ErrorKind::UnclassifiableQuery,
            Self::Validation { .. } => ErrorKind::ValidationError,
            Self::Cancelled { .. } => ErrorKind::QueryCancelled,
            Self::Provider { .. } | Self::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// Message without the kind prefix, for event payloads that carry the kind separately
    pub fn detail(&self) -> String {
        match self {
            Self::Configuration { message }
            | Self::Embedding { message }
            | Self::Generation { message }
            | Self::CacheWriteDegraded { message }
            | Self::UnclassifiableQuery { message }
            | Self::Validation { message }
            | Self::Internal { message } => message.clone(),
            Self::Retrieval {
                collaborator,
                message,
            } => format!("{}: {}", collaborator, message),
            Self::Provider { provider, message } => format!("{}: {}", provider, message),
            other => other.to_string(),
        }
    }
}
