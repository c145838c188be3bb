//! Infrastructure layer - Collaborator adapters, services and runtime plumbing

pub mod embedding;
pub mod http_client;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod retrieval;
pub mod semantic_cache;
pub mod services;
pub mod session;
