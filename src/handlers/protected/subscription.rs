// handlers/protected/subscription.rs - subscription cancel and read

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{OwnerKey, Subscription};
use crate::middleware::{ApiResponse, ApiResult, BearerToken};
use crate::services::CancelRequest;
use crate::types::OwnerType;

/// POST /api/subscriptions/cancel - `{ownerType, ownerId}` → 200 `{status: "canceled"}`.
/// Only the local mirror changes; nothing is sent to Paddle.
pub async fn cancel_subscription(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<CancelRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(request) = payload?;
    let key = request.validate()?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let row = state.subscriptions().cancel(&caller, key).await?;
    Ok(ApiResponse::success(json!({ "status": row.status })))
}

/// GET /api/subscriptions/:ownerType/:ownerId
pub async fn show_subscription(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<(OwnerType, Uuid)>, PathRejection>,
) -> ApiResult<Subscription> {
    let Path((owner_type, owner_id)) = path?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let row = state.subscriptions().show(&caller, OwnerKey::new(owner_type, owner_id)).await?;
    Ok(ApiResponse::success(row))
}
