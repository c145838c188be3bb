use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::ErrorKind;
use crate::domain::search::{LogLevel, SearchResponse};
use crate::domain::semantic_cache::CacheStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Connected,
    Processing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusUpdate {
    pub status: QueryStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub component: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorData {
    pub error_type: ErrorKind,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

/// Body of an outbound event, tagged as `{type, data}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    Status(StatusUpdate),
    LogMessage(LogEntry),
    SearchResponse(Box<SearchResponse>),
    CacheStats(CacheStats),
    Pong {},
    Error(ErrorData),
}

impl EventPayload {
    /// Whether this payload ends an in-flight query
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SearchResponse(_) | Self::Error(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::LogMessage(_) => "log_message",
            Self::SearchResponse(_) => "search_response",
            Self::CacheStats(_) => "cache_stats",
            Self::Pong {} => "pong",
            Self::Error(_) => "error",
        }
    }
}

/// One numbered message on a session's outbound stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub session_id: String,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(payload: EventPayload) -> serde_json::Value {
        serde_json::to_value(SessionEvent {
            session_id: "s-1".into(),
            sequence: 7,
            timestamp: Utc::now(),
            payload,
        })
        .unwrap()
    }

    #[test]
    fn test_error_event_shape() {
        let json = event(EventPayload::Error(ErrorData {
            error_type: ErrorKind::SessionBusyError,
            error: "busy".into(),
            query_id: None,
        }));

        assert_eq!(json["type"], "error");
        assert_eq!(json["session_id"], "s-1");
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["data"]["error_type"], "SessionBusyError");
        assert!(json["data"].get("query_id").is_none());
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_pong_has_empty_data() {
        let json = event(EventPayload::Pong {});
        assert_eq!(json["type"], "pong");
        assert_eq!(json["data"], serde_json::json!({}));
    }

    #[test]
    fn test_log_event_shape() {
        let json = event(EventPayload::LogMessage(LogEntry {
            level: LogLevel::Warning,
            message: "escalating".into(),
            component: "RetrievalOrchestrator".into(),
        }));

        assert_eq!(json["type"], "log_message");
        assert_eq!(json["data"]["level"], "WARNING");
    }

    #[test]
    fn test_terminal_payloads() {
        let status = EventPayload::Status(StatusUpdate {
            status: QueryStatus::Processing,
            message: "working".into(),
            query_id: Some("q".into()),
        });

        assert!(!status.is_terminal());
        assert_eq!(status.type_name(), "status");
        assert!(
            EventPayload::Error(ErrorData {
                error_type: ErrorKind::InternalError,
                error: "x".into(),
                query_id: None,
            })
            .is_terminal()
        );
    }
}
