use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use serde::Serialize;

use skyburst_core::coords::is_normalized;
use skyburst_core::geo::GeoPoint;
use skyburst_core::net::messages::FireworkEvent;

use crate::error::AppError;
use crate::state::AppState;

/// Longest accepted client id.
const MAX_CLIENT_ID_LEN: usize = 128;

/// Body of every successful publish.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// Reject events that cannot be rendered or would abuse the channel.
fn validate_firework(event: &FireworkEvent) -> Result<(), AppError> {
    if !is_normalized(event.x) || !is_normalized(event.y) {
        return Err(AppError::BadRequest(
            "x and y must be within [0, 1]".to_string(),
        ));
    }
    if event.client_id.is_empty() {
        return Err(AppError::BadRequest("clientId is required".to_string()));
    }
    if event.client_id.len() > MAX_CLIENT_ID_LEN {
        return Err(AppError::BadRequest(format!(
            "clientId exceeds {MAX_CLIENT_ID_LEN} chars"
        )));
    }
    if event.client_id.chars().any(char::is_control) {
        return Err(AppError::BadRequest(
            "clientId contains control characters".to_string(),
        ));
    }
    if !event.color.is_valid() {
        return Err(AppError::BadRequest(
            "color must be a 24-bit 0xRRGGBB value".to_string(),
        ));
    }
    if let Some(origin) = event.origin()
        && !origin.is_valid()
    {
        return Err(AppError::BadRequest(
            "latitude/longitude out of range".to_string(),
        ));
    }
    Ok(())
}

/// Drop a half-specified or unusable origin so receivers fall back to zero distance.
fn normalize_origin(mut event: FireworkEvent) -> FireworkEvent {
    if GeoPoint::from_parts(event.latitude, event.longitude).is_none() {
        event.latitude = None;
        event.longitude = None;
    }
    event
}

/// POST /api/firework: Throttle and relay one firework to every viewer.
pub async fn post_firework(
    State(state): State<AppState>,
    body: Result<Json<FireworkEvent>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(event) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    validate_firework(&event)?;
    let event = normalize_origin(event);

    let client_id = event.client_id.clone();
    state.relay.publish(event, &client_id).await?;
    Ok(SuccessResponse::ok())
}

/// POST /api/happy-new-year: Broadcast the epoch celebration.
pub async fn post_happy_new_year(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.relay.publish_epoch()?;
    Ok(SuccessResponse::ok())
}
