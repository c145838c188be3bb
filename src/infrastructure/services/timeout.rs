//! Bounded waits on remote collaborators

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::timeout;

use crate::domain::DomainError;
use crate::infrastructure::observability::record_collaborator_error;

/// Upper bound, per call, on each remote collaborator
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_embedding_ms")]
    pub embedding_ms: u64,
    #[serde(default = "default_generation_ms")]
    pub generation_ms: u64,
    #[serde(default = "default_index_ms")]
    pub index_ms: u64,
    #[serde(default = "default_web_search_ms")]
    pub web_search_ms: u64,
}

fn default_embedding_ms() -> u64 {
    10_000
}

fn default_generation_ms() -> u64 {
    60_000
}

fn default_index_ms() -> u64 {
    10_000
}

fn default_web_search_ms() -> u64 {
    30_000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embedding_ms: default_embedding_ms(),
            generation_ms: default_generation_ms(),
            index_ms: default_index_ms(),
            web_search_ms: default_web_search_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn embedding(&self) -> Duration {
        Duration::from_millis(self.embedding_ms)
    }

    pub fn generation(&self) -> Duration {
        Duration::from_millis(self.generation_ms)
    }

    pub fn index(&self) -> Duration {
        Duration::from_millis(self.index_ms)
    }

    pub fn web_search(&self) -> Duration {
        Duration::from_millis(self.web_search_ms)
    }

    /// Same bound for every collaborator
    pub fn uniform(ms: u64) -> Self {
        Self {
            embedding_ms: ms,
            generation_ms: ms,
            index_ms: ms,
            web_search_ms: ms,
        }
    }
}

/// Run `future`, failing with `CollaboratorTimeout` once `limit` passes.
/// Every failure is counted against `collaborator`.
pub async fn bounded<T, F>(
    collaborator: &'static str,
    limit: Duration,
    future: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    let result = match timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::timeout(collaborator, limit.as_millis() as u64)),
    };

    if let Err(ref e) = result {
        record_collaborator_error(collaborator, e.kind());
    }

    result
}
