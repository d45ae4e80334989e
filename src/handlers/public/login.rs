// handlers/public/login.rs - POST /auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{LoginRequest, LoginResult};

/**
 * POST /auth/login - password sign-in relayed to the identity provider
 *
 * Input: `{ "email": "..." | "username": "...", "password": "..." }`. A
 * username without `@` is a managed clinic login and gets the managed email
 * domain appended.
 *
 * Output: `{ "accessToken", "expiresIn", "profile"? }`. `profile` is absent
 * while the account is still being provisioned.
 */
pub async fn login(State(state): State<AppState>, payload: Result<Json<LoginRequest>, JsonRejection>) -> ApiResult<LoginResult> {
    let Json(request) = payload?;
    let result = state.profiles().login(&request).await?;
    Ok(ApiResponse::success(result))
}
