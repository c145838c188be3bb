//! Ordered outbound event queue for one session

use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::session::{ErrorData, LogEntry};
use crate::domain::{DomainError, EventPayload, LogLevel, ProgressReporter, SessionEvent};

struct SinkInner {
    next_sequence: u64,
    sender: mpsc::UnboundedSender<SessionEvent>,
}

/// Numbers events and enqueues them in one step, so sequence order is queue order
pub struct EventSink {
    session_id: String,
    inner: Mutex<SinkInner>,
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("session_id", &self.session_id)
            .finish()
    }
}

impl EventSink {
    pub fn new(session_id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let sink = Self {
            session_id: session_id.into(),
            inner: Mutex::new(SinkInner {
                next_sequence: 1,
                sender,
            }),
        };
        (sink, receiver)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Enqueue `payload`. Returns false once the consumer is gone.
    pub fn emit(&self, payload: EventPayload) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };

        let event = SessionEvent {
            session_id: self.session_id.clone(),
            sequence: inner.next_sequence,
            timestamp: Utc::now(),
            payload,
        };

        if inner.sender.send(event).is_err() {
            debug!(session_id = %self.session_id, "Event dropped; consumer closed");
            return false;
        }

        inner.next_sequence += 1;
        true
    }

    pub fn emit_error(&self, error: &DomainError, query_id: Option<&str>) -> bool {
        self.emit(EventPayload::Error(ErrorData {
            error_type: error.kind(),
            error: error.detail(),
            query_id: query_id.map(str::to_string),
        }))
    }
}

impl ProgressReporter for EventSink {
    fn log(&self, level: LogLevel, component: &str, message: &str) {
        self.emit(EventPayload::LogMessage(LogEntry {
            level,
            message: message.to_string(),
            component: component.to_string(),
        }));
    }
}
