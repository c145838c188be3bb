//! Document index and web-search adapters

mod ares;
mod qdrant;

pub use ares::{AresWebSearch, DEFAULT_ARES_URL};
pub use qdrant::QdrantDocumentIndex;
