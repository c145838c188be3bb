//! Domain layer - Core types, collaborator contracts and invariants

pub mod embedding;
pub mod error;
pub mod llm;
pub mod retrieval;
pub mod routing;
pub mod search;
pub mod semantic_cache;
pub mod session;

pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::{DomainError, ErrorKind};
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message, MessageRole, ResponseFormat};
pub use retrieval::{
    DocumentIndex, IndexMatch, QueryOptions, RetrievalConfig, SourceRef, SourceType, WebResult,
    WebSearchProvider,
};
pub use routing::{DecisionSource, KeywordHeuristic, RouteCategory, RouteDecision, RouterConfig};
pub use search::{
    CacheMetrics, LogLevel, NoopReporter, ProgressReporter, RetrievalOutcome, SearchQuery,
    SearchResponse, SubQueryReport,
};
pub use semantic_cache::{
    CacheEntry, CacheHit, CacheLookup, CacheSnapshot, CacheStats, CacheStore, SemanticCacheConfig,
};
pub use session::{EventPayload, InboundCommand, SessionEvent, SessionState};
