//! Per-connection session protocol: inbound commands, outbound events, lifecycle

mod command;
mod event;
mod state;

pub use command::InboundCommand;
pub use event::{ErrorData, EventPayload, LogEntry, QueryStatus, SessionEvent, StatusUpdate};
pub use state::SessionState;
