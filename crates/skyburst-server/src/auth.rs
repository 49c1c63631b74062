use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::AppError;
use crate::state::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Middleware guarding the epoch trigger. If no `epoch.trigger_token` is
/// configured, all requests are allowed through.
pub async fn epoch_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(ref expected) = state.config.epoch.trigger_token {
        match bearer_token(request.headers()) {
            Some(token) if token == expected => {},
            _ => {
                tracing::warn!("Rejected epoch trigger with missing or wrong token");
                return Err(AppError::Unauthorized("Unauthorized".to_string()));
            },
        }
    }
    Ok(next.run(request).await)
}
