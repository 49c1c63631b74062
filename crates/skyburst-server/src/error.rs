use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::relay::PublishError;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    TooManyRequests(String),
    Unauthorized(String),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(m)
            | Self::TooManyRequests(m)
            | Self::Unauthorized(m)
            | Self::Internal(m) => write!(f, "{m}"),
        }
    }
}

impl From<PublishError> for AppError {
    fn from(e: PublishError) -> Self {
        match e {
            PublishError::Throttled { .. } => Self::TooManyRequests(e.to_string()),
            PublishError::Transport(inner) => {
                tracing::error!(error = %inner, "Broadcast publish failed");
                Self::Internal("Failed to trigger event".to_string())
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            Self::TooManyRequests(m) => (StatusCode::TOO_MANY_REQUESTS, m),
            Self::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            Self::Internal(m) => (StatusCode::INTERNAL_SERVER_ERROR, m),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
