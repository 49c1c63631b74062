pub mod api;
pub mod auth;
pub mod config;
pub mod epoch;
pub mod error;
pub mod health;
pub mod rate_limit;
pub mod relay;
pub mod sse;
pub mod state;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::services::ServeDir;

use config::ServerConfig;
use relay::Broadcaster;
use state::AppState;

/// Build the Axum router and application state from a config, using the
/// in-process channel hub.
pub fn build_app(config: ServerConfig) -> (Router<()>, AppState) {
    let state = AppState::new(config);
    (router(state.clone()), state)
}

/// Same as [`build_app`] with a caller-supplied fan-out transport.
pub fn build_app_with_broadcaster(
    config: ServerConfig,
    broadcaster: Arc<dyn Broadcaster>,
) -> (Router<()>, AppState) {
    let state = AppState::with_broadcaster(config, broadcaster);
    (router(state.clone()), state)
}

fn router(state: AppState) -> Router<()> {
    let web_root = state.config.web_root.clone();

    // Epoch trigger sits behind the optional bearer token
    let epoch_routes = Router::new()
        .route("/happy-new-year", post(api::post_happy_new_year))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::epoch_auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/firework", post(api::post_firework))
        .route("/stream", get(sse::channel_stream))
        .merge(epoch_routes);

    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/health", get(health::health_check))
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&web_root))
        .with_state(state)
}

/// Start the background tasks the server needs: the rate-limit sweeper and,
/// when configured, the epoch timer.
pub fn spawn_background_tasks(state: &AppState) {
    rate_limit::spawn_rate_limit_sweeper(
        Arc::clone(state.relay.limiter()),
        state.config.limits.sweep_interval(),
    );
    if let Some(target) = state.config.epoch.target_unix_secs {
        epoch::spawn_epoch_timer(state.relay.clone(), target);
    }
}
