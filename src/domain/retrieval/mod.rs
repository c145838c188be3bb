//! Retrieval collaborators and the evidence they return

mod config;
mod index;
mod options;
mod source;
mod web;

pub use config::RetrievalConfig;
pub use index::{DocumentIndex, IndexMatch};
pub use options::QueryOptions;
pub use source::{SourceRef, SourceType};
pub use web::{WebResult, WebSearchProvider};

#[cfg(test)]
pub use index::MockDocumentIndex;
#[cfg(test)]
pub use web::MockWebSearchProvider;
