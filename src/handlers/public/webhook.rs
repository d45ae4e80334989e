// handlers/public/webhook.rs - POST /api/webhooks/paddle handler

use axum::{body::Bytes, extract::State, http::HeaderMap, response::IntoResponse, response::Response};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::billing::{self, SIGNATURE_HEADER};
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::services::EventOutcome;

/**
 * POST /api/webhooks/paddle - mirror a Paddle subscription event
 *
 * With `PADDLE_WEBHOOK_SECRET` configured the `Paddle-Signature` header must
 * verify against the raw body, otherwise 401. Events that cannot be applied
 * (not JSON, no owner metadata) are acknowledged with 202 `{}` so Paddle
 * stops redelivering them. Applied events answer 200 `{"received": true}`.
 */
pub async fn paddle_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Result<Response, ApiError> {
    let billing_config = &state.config.billing;

    match &billing_config.webhook_secret {
        Some(secret) => {
            let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
            if let Err(e) = billing::verify_signature(&body, signature, secret, billing_config.signature_tolerance_secs) {
                tracing::warn!("Rejected Paddle webhook: {}", e);
                return Err(ApiError::unauthorized(e.to_string()));
            }
        }
        None => tracing::warn!("PADDLE_WEBHOOK_SECRET not set; accepting unsigned webhook"),
    }

    let event: Value = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Ignoring malformed Paddle webhook: {}", e);
            return Ok(ApiResponse::accepted(json!({})).into_response());
        }
    };

    match state.subscriptions().apply_event(&event).await? {
        EventOutcome::Applied(_) => Ok(ApiResponse::success(json!({ "received": true })).into_response()),
        EventOutcome::Ignored(_) => Ok(ApiResponse::accepted(json!({})).into_response()),
    }
}
