//! Request and response types for the HTTP surface

pub mod error;
pub mod json;
pub mod search;

pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use search::{CacheStatsResponse, ClearCacheResponse, SearchRequest};
