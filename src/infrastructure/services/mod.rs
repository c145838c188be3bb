//! Application services wiring the domain to its collaborators

mod completion_gateway;
mod embedding_gateway;
mod retrieval_service;
mod router_service;
mod search_service;
mod semantic_cache_service;
mod timeout;

pub use completion_gateway::CompletionGateway;
pub use embedding_gateway::EmbeddingGateway;
pub use retrieval_service::{RetrievalOrchestrator, WEB_DISABLED_ANSWER};
pub use router_service::RouterService;
pub use search_service::{PendingInsert, Resolved, SearchService};
pub use semantic_cache_service::SemanticCacheService;
pub use timeout::{TimeoutConfig, bounded};

#[cfg(test)]
pub use search_service::fixtures;
