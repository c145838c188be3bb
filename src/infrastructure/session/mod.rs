//! Session event pipeline

mod session;
mod sink;

pub use session::QuerySession;
pub use sink::EventSink;
