//! WebSocket transport for query sessions
//!
//! One socket is one [`QuerySession`]. A writer task drains the session's
//! event queue onto the socket in order while the read loop feeds client
//! messages into the session.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::infrastructure::services::SearchService;
use crate::infrastructure::session::QuerySession;

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub client_id: Option<String>,
}

impl WsParams {
    /// Session id: the client's own id when given, otherwise a fresh one
    pub fn session_id(self) -> String {
        self.client_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string())
    }
}

/// GET /ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Response {
    let session_id = params.session_id();
    info!(session_id = %session_id, "WebSocket upgrade requested");

    ws.on_upgrade(move |socket| run_socket(socket, session_id, state.search, state.shutdown))
}

/// How long queued events get to reach the client once the session ends
const WRITER_DRAIN: Duration = Duration::from_secs(1);

async fn run_socket(
    socket: WebSocket,
    session_id: String,
    search: Arc<SearchService>,
    shutdown: CancellationToken,
) {
    let (mut outbound, mut inbound) = socket.split();
    let (session, events) = QuerySession::open(session_id, search);

    let writer_id = session.id().to_string();
    let mut writer = tokio::spawn(async move {
        let mut events = UnboundedReceiverStream::new(events);

        while let Some(event) = events.next().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(session_id = %writer_id, error = %e, "Dropping unserializable event");
                    continue;
                }
            };

            if outbound.send(Message::Text(text.into())).await.is_err() {
                debug!(session_id = %writer_id, "Client went away while sending");
                break;
            }
        }

        let _ = outbound.close().await;
    });

    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => {
                info!(session_id = %session.id(), "Server shutting down; closing session");
                break;
            }
            message = inbound.next() => message,
        };

        match message {
            Some(Ok(Message::Text(text))) => session.handle_text(text.as_str()),
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(Message::Binary(_))) => {
                debug!(session_id = %session.id(), "Ignoring binary frame");
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                debug!(session_id = %session.id(), error = %e, "WebSocket read failed");
                break;
            }
        }
    }

    session.close();
    drop(session);
    if tokio::time::timeout(WRITER_DRAIN, &mut writer).await.is_err() {
        writer.abort();
    }
}
