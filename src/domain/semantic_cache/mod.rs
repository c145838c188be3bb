//! Semantic cache domain models and traits
//!
//! Answers are keyed by question embeddings and matched by vector similarity
//! rather than exact text, so paraphrased questions reuse earlier answers.

mod config;
mod entry;
mod store;

pub use config::SemanticCacheConfig;
pub use entry::{CacheEntry, CacheHit, CacheLookup, CacheStats};
pub use store::{CacheSnapshot, CacheStore, SNAPSHOT_VERSION};
