// handlers/public/signup.rs - POST /api/signup/independent-clinic handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{IndependentSignup, SignedUpClinic};

/// Self-serve signup: `{name, email, password, phoneNumber?}` → 201 `{profile, clinic}`
pub async fn signup_independent_clinic(
    State(state): State<AppState>,
    payload: Result<Json<IndependentSignup>, JsonRejection>,
) -> ApiResult<SignedUpClinic> {
    let Json(request) = payload?;
    let created = state.provisioning().signup_independent_clinic(&request).await?;
    Ok(ApiResponse::created(created))
}
