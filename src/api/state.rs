//! Application state for shared services

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::domain::DocumentIndex;
use crate::infrastructure::services::{SearchService, SemanticCacheService};

/// Everything a handler needs; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
    pub cache: Arc<SemanticCacheService>,
    pub index: Arc<dyn DocumentIndex>,
    /// Cancelled on a fault the server must stop for
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(search: Arc<SearchService>, index: Arc<dyn DocumentIndex>) -> Self {
        Self {
            cache: search.cache().clone(),
            shutdown: search.shutdown_token(),
            search,
            index,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub async fn test_state(
    llm: crate::domain::llm::MockLlmProvider,
    index_health: impl Fn() -> Result<bool, crate::domain::DomainError> + Send + Sync + 'static,
) -> (AppState, crate::infrastructure::services::fixtures::Pipeline) {
    use crate::domain::retrieval::MockDocumentIndex;
    use crate::infrastructure::services::fixtures;

    let pipeline = fixtures::pipeline(llm).await;

    let mut index = MockDocumentIndex::new();
    index.expect_health_check().returning(index_health);
    index.expect_index_name().return_const("mock-index");

    let state = AppState::new(pipeline.search.clone(), Arc::new(index));

    (state, pipeline)
}
