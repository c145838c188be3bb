//! Embedding gateway domain models and traits

mod provider;
mod types;
pub mod vector;

pub use provider::EmbeddingProvider;
pub use types::{EmbeddingRequest, EmbeddingResponse};

#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
