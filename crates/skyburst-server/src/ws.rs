use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use skyburst_core::net::messages::ChannelMessage;
use skyburst_core::net::protocol::encode_channel_message;

use crate::state::{AppState, ConnectionGuard};

/// GET /ws: Binary subscriber stream. Every channel message arrives as one
/// binary frame (type byte + MessagePack payload). Inbound frames are ignored;
/// fireworks are published through `POST /api/firework`.
pub async fn ws_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Result<Response, StatusCode> {
    let max_ws = state.config.limits.max_ws_connections;
    let current = state.ws_connection_count.load(Ordering::Relaxed);
    if current >= max_ws {
        tracing::warn!(current, max = max_ws, "WS connection limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let rx = state.relay.subscribe().map_err(|e| {
        tracing::error!(error = %e, "WS subscribe failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let guard = ConnectionGuard::new(Arc::clone(&state.ws_connection_count));

    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, rx, guard))
        .into_response())
}

async fn handle_socket(
    socket: WebSocket,
    mut rx: broadcast::Receiver<ChannelMessage>,
    _guard: ConnectionGuard,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    tracing::debug!("Subscriber connected");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(msg) => {
                    let Some(frame) = encode_frame(&msg) else {
                        continue;
                    };
                    if ws_sender.send(Message::Binary(frame)).await.is_err() {
                        break;
                    }
                },
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "WS subscriber lagged");
                },
                Err(RecvError::Closed) => break,
            },
            inbound = ws_receiver.next() => match inbound {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {},
            },
        }
    }

    tracing::debug!("Subscriber disconnected");
}

fn encode_frame(msg: &ChannelMessage) -> Option<Bytes> {
    match encode_channel_message(msg) {
        Ok(data) => Some(Bytes::from(data)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode WS frame");
            None
        },
    }
}
