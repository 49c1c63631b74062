use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use futures::stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use skyburst_core::net::messages::ChannelMessage;
use skyburst_core::net::protocol::encode_json;

use crate::state::{AppState, ConnectionGuard};

/// GET /api/stream: Subscribe to the shared channel as Server-Sent Events.
/// The SSE event name is the channel event name, the data is its JSON payload.
pub async fn channel_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, StatusCode> {
    let max_sse = state.config.limits.max_sse_subscribers;
    let current = state.sse_subscriber_count.load(Ordering::Relaxed);
    if current >= max_sse {
        tracing::warn!(current, max = max_sse, "SSE subscriber limit reached");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    let rx = state.relay.subscribe().map_err(|e| {
        tracing::error!(error = %e, "SSE subscribe failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let guard = ConnectionGuard::new(Arc::clone(&state.sse_subscriber_count));

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let _guard = &guard;
        match result {
            Ok(msg) => to_sse_event(&msg).map(Ok),
            Err(e) => {
                tracing::warn!("SSE subscriber lagged: {e}");
                None
            },
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(msg: &ChannelMessage) -> Option<SseEvent> {
    match encode_json(msg) {
        Ok(json) => Some(SseEvent::default().event(msg.event_name()).data(json)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode SSE payload");
            None
        },
    }
}
