//! WebSocket endpoint of the real-time channel.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{FromRef, Query, State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing::{debug, instrument, warn};

use crate::protocol::{ClientMessage, ServerFrame, parse_client_message};
use crate::registry::{ClientInfo, ConnectionId, ConnectionRegistry};

/// Interval between server-initiated WebSocket pings.
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Identity a client declares in the upgrade request's query string.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Staff role.
    pub role: Option<String>,
    /// Station served.
    pub station: Option<String>,
}

impl From<ConnectParams> for ClientInfo {
    fn from(params: ConnectParams) -> Self {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            role: non_blank(params.role),
            station: non_blank(params.station),
        }
    }
}

/// Routes for the real-time channel: `GET /ws`.
pub fn routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    Arc<ConnectionRegistry>: FromRef<S>,
{
    Router::new().route("/ws", get(ws_handler))
}

/// Upgrades the request and serves the connection until either side closes.
#[instrument(skip_all, fields(role = params.role.as_deref(), station = params.station.as_deref()))]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(registry): State<Arc<ConnectionRegistry>>,
) -> Response {
    let info = ClientInfo::from(params);
    ws.on_upgrade(move |socket| handle_socket(socket, registry, info))
}

async fn handle_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>, info: ClientInfo) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let connection = registry.connect(info);
    let id = connection.id;
    let mut frames = connection.frames;

    let mut forward = tokio::spawn(async move {
        while let Some(message) = frames.recv().await {
            if ws_tx.send(message).await.is_err() {
                return;
            }
        }
        // Registry dropped the connection: say goodbye.
        let _ = ws_tx.send(Message::Close(None)).await;
    });

    let mut ping = interval_at(tokio::time::Instant::now() + PING_INTERVAL, PING_INTERVAL);
    ping.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            _ = &mut forward => break,

            incoming = ws_rx.next() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(message)) => handle_message(&registry, &id, message),
            },

            _ = ping.tick() => {
                if !registry.send(&id, Message::Ping(Vec::new().into())) {
                    debug!(connection_id = %id, "ping not queued");
                }
            }
        }
    }

    registry.disconnect(&id);
    forward.abort();
}

fn handle_message(registry: &ConnectionRegistry, id: &ConnectionId, message: Message) {
    let reply = match message {
        Message::Text(text) => match parse_client_message(text.as_str()) {
            Ok(ClientMessage::Ping) => ServerFrame::Pong,
            Err(e) => {
                warn!(connection_id = %id, error = %e, "malformed client frame");
                ServerFrame::Error {
                    message: format!("malformed frame: {e}"),
                }
            }
        },
        Message::Binary(_) => ServerFrame::Error {
            message: "binary frames are not supported".into(),
        },
        // Protocol-level ping/pong is answered by the transport.
        Message::Ping(_) | Message::Pong(_) | Message::Close(_) => return,
    };
    registry.send(id, Message::Text(reply.to_json().into()));
}
