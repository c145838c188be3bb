//! Per-connection query session
//!
//! `Idle -> Processing -> Idle`, ending in `Closed`. At most one query runs
//! at a time; the terminal event of a query and the return to `Idle` happen
//! under one lock, so a follow-up search never races the previous result.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use super::sink::EventSink;
use crate::domain::session::{QueryStatus, StatusUpdate};
use crate::domain::{
    DomainError, EventPayload, InboundCommand, ProgressReporter, QueryOptions, SearchQuery,
    SessionEvent, SessionState,
};
use crate::infrastructure::observability::{session_closed, session_opened};
use crate::infrastructure::services::SearchService;

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    query: Option<CancellationToken>,
}

type Shared = Arc<Mutex<Inner>>;

fn lock(inner: &Shared) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
pub struct QuerySession {
    id: String,
    sink: Arc<EventSink>,
    inner: Shared,
    search: Arc<SearchService>,
    shutdown: CancellationToken,
}

impl QuerySession {
    /// Open a session and announce it with a `status(connected)` event
    pub fn open(
        session_id: impl Into<String>,
        search: Arc<SearchService>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let id = session_id.into();
        let (sink, events) = EventSink::new(&id);

        sink.emit(EventPayload::Status(StatusUpdate {
            status: QueryStatus::Connected,
            message: "Connected to semantic search".to_string(),
            query_id: None,
        }));
        session_opened();
        info!(session_id = %id, "Session opened");

        let session = Self {
            id,
            sink: Arc::new(sink),
            inner: Arc::new(Mutex::new(Inner::default())),
            search,
            shutdown: CancellationToken::new(),
        };

        (session, events)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state.clone()
    }

    /// Decode and dispatch one raw client message
    pub fn handle_text(&self, text: &str) {
        match InboundCommand::parse(text) {
            Ok(command) => self.handle(command),
            Err(e) => {
                debug!(session_id = %self.id, error = %e, "Rejected client message");
                self.sink.emit_error(&e, None);
            }
        }
    }

    pub fn handle(&self, command: InboundCommand) {
        match command {
            InboundCommand::SearchQuery { query, options } => self.start_search(query, options),
            InboundCommand::CacheStats => {
                self.sink
                    .emit(EventPayload::CacheStats(self.search.cache().stats()));
            }
            InboundCommand::Ping => {
                self.sink.emit(EventPayload::Pong {});
            }
            InboundCommand::Cancel => self.cancel(),
        }
    }

    fn start_search(&self, text: String, options: QueryOptions) {
        let query = match SearchQuery::new(text, options) {
            Ok(query) => query,
            Err(e) => {
                self.sink.emit_error(&e, None);
                return;
            }
        };

        let query_id = Uuid::new_v4().to_string();

        let token = {
            let mut inner = lock(&self.inner);
            match &inner.state {
                SessionState::Closed => return,
                SessionState::Processing { query_id: busy } => {
                    let err = DomainError::session_busy(&self.id, busy.clone());
                    warn!(session_id = %self.id, in_flight = %busy, "Search rejected; session busy");
                    self.sink.emit_error(&err, None);
                    return;
                }
                SessionState::Idle => {}
            }

            let token = self.shutdown.child_token();
            inner.state = SessionState::Processing {
                query_id: query_id.clone(),
            };
            inner.query = Some(token.clone());

            self.sink.emit(EventPayload::Status(StatusUpdate {
                status: QueryStatus::Processing,
                message: "Processing query".to_string(),
                query_id: Some(query_id.clone()),
            }));

            token
        };

        let span = info_span!("query", session_id = %self.id, query_id = %query_id);
        let task = QueryTask {
            sink: self.sink.clone(),
            inner: self.inner.clone(),
            search: self.search.clone(),
            query_id,
            query,
            token,
        };

        tokio::spawn(task.run().instrument(span));
    }

    /// Abort the in-flight query; its terminal event will be `QueryCancelled`
    pub fn cancel(&self) {
        let inner = lock(&self.inner);
        match (&inner.state, &inner.query) {
            (SessionState::Processing { query_id }, Some(token)) => {
                info!(session_id = %self.id, query_id = %query_id, "Cancelling query");
                token.cancel();
            }
            _ => {
                self.sink
                    .emit_error(&DomainError::validation("No query in flight to cancel"), None);
            }
        }
    }

    /// Enter `Closed` and cancel whatever is running. Idempotent.
    pub fn close(&self) {
        let mut inner = lock(&self.inner);
        if inner.state.is_closed() {
            return;
        }

        inner.state = SessionState::Closed;
        inner.query = None;
        self.shutdown.cancel();
        session_closed();
        info!(session_id = %self.id, "Session closed");
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        self.close();
    }
}

struct QueryTask {
    sink: Arc<EventSink>,
    inner: Shared,
    search: Arc<SearchService>,
    query_id: String,
    query: SearchQuery,
    token: CancellationToken,
}

impl QueryTask {
    async fn run(self) {
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(DomainError::cancelled(&self.query_id)),
            resolved = self.search.resolve(&self.query_id, &self.query, self.sink.as_ref()) => resolved,
        };

        let payload = match result {
            Ok(resolved) if !self.token.is_cancelled() => {
                let mut response = resolved.response;
                if let Some(pending) = resolved.pending {
                    match self.search.commit_unless_cancelled(pending, &self.token).await {
                        Ok(true) => response.cache_metrics.cache_size = self.search.cache().len(),
                        Ok(false) => debug!("Query cancelled before its answer was cached"),
                        Err(e) => {
                            warn!(error = %e, "Answer not persisted");
                            self.sink.warning(
                                "SemanticCache",
                                &format!("Answer kept in memory only: {}", e.detail()),
                            );
                        }
                    }
                }
                EventPayload::SearchResponse(Box::new(response))
            }
            Ok(_) => self.error_payload(&DomainError::cancelled(&self.query_id)),
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "Query failed");
                self.error_payload(&e)
            }
        };

        self.finish(payload);
    }

    fn error_payload(&self, error: &DomainError) -> EventPayload {
        EventPayload::Error(crate::domain::session::ErrorData {
            error_type: error.kind(),
            error: error.detail(),
            query_id: Some(self.query_id.clone()),
        })
    }

    /// Emit the terminal event and return to idle, unless the session moved on
    fn finish(&self, payload: EventPayload) {
        let mut inner = lock(&self.inner);
        if inner.state.in_flight() != Some(self.query_id.as_str()) {
            debug!("Session closed before the query finished; dropping result");
            return;
        }

        self.sink.emit(payload);
        inner.state = SessionState::Idle;
        inner.query = None;
    }
}
