// handlers/protected/profile.rs - GET /api/me and GET /api/guard

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::access::{self, GuardDecision};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, BearerToken};
use crate::services::{ProfileStatus, ServiceError};
use crate::types::Role;

/// GET /api/me - 200 `{status: "ready", profile}` or 202 `{status: "provisioning"}`
pub async fn me(State(state): State<AppState>, token: BearerToken) -> Result<Response, ApiError> {
    let status = state.profiles().status(token.as_deref()).await?;

    Ok(match status {
        ProfileStatus::Ready { .. } => ApiResponse::success(status).into_response(),
        ProfileStatus::Provisioning => ApiResponse::accepted(status).into_response(),
    })
}

#[derive(Debug, Deserialize)]
pub struct GuardQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GuardResponse {
    #[serde(flatten)]
    pub decision: GuardDecision,
    pub role: Option<Role>,
}

/// GET /api/guard?path= - evaluate the route guard for the bearer's role.
/// No token, or one that does not resolve, evaluates as an anonymous visitor.
pub async fn guard(
    State(state): State<AppState>,
    token: BearerToken,
    query: Result<Query<GuardQuery>, QueryRejection>,
) -> ApiResult<GuardResponse> {
    let Query(query) = query?;
    let path = query
        .path
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing path"))?;

    let role = match token.as_deref() {
        None => None,
        Some(token) => match state.profiles().caller(Some(token)).await {
            Ok(caller) => caller.role(),
            Err(ServiceError::Unauthenticated(_)) => None,
            Err(other) => return Err(other.into()),
        },
    };

    Ok(ApiResponse::success(GuardResponse {
        decision: access::guard(&path, role),
        role,
    }))
}
