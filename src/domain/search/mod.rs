//! Search pipeline inputs, outputs and progress reporting

mod outcome;
mod progress;
mod query;
mod response;

pub use outcome::{RetrievalOutcome, SubQueryFailure, SubQueryReport};
pub use progress::{LogLevel, NoopReporter, ProgressReporter};
pub use query::{MAX_QUERY_CHARS, SearchQuery};
pub use response::{CacheMetrics, SearchResponse};

#[cfg(test)]
pub use progress::RecordingReporter;
