use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::{ApiError, AppState, UserToken};
use crate::actions::{build_payload, Action, ActionRequest};

/// POST /api/action
/// Validates the action name before anything leaves the process, then
/// relays Trakt's JSON answer untouched.
pub async fn perform(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<UserToken>,
    body: Result<Json<ActionRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let action: Action = request.action.parse()?;
    let item = request
        .item
        .ok_or_else(|| ApiError::BadRequest("Missing item".to_string()))?;

    let upstreams = state.upstreams()?;
    let payload = build_payload(&item);
    info!("Performing {:?} on {} {}", action, item.media_type.as_deref().unwrap_or("tv"), item.id);

    let response = upstreams
        .trakt
        .sync(action.endpoint(), &payload, token.as_str())
        .await?;
    Ok(Json(response))
}
