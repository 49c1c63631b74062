use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub environment: &'static str,
    pub channel: String,
    pub connections: ConnectionInfo,
    pub rate_limiter: RateLimiterInfo,
}

#[derive(Serialize)]
pub struct ConnectionInfo {
    pub websocket: usize,
    pub sse: usize,
}

#[derive(Serialize)]
pub struct RateLimiterInfo {
    pub tracked_clients: usize,
}

/// GET /health: Server status, subscriber counts and rate limiter size.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ws = state.ws_connection_count.load(Ordering::Relaxed);
    let sse = state.sse_subscriber_count.load(Ordering::Relaxed);
    let tracked_clients = state.relay.limiter().tracked_clients().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.as_str(),
        channel: state.relay.channel().to_string(),
        connections: ConnectionInfo { websocket: ws, sse },
        rate_limiter: RateLimiterInfo { tracked_clients },
    })
}
