//! Semantic cache persistence backends

mod file_store;
mod in_memory;

pub use file_store::JsonFileCacheStore;
pub use in_memory::InMemoryCacheStore;
