// handlers/protected/clinic.rs - clinic settings and call log

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Call, Clinic, ClinicChanges};
use crate::middleware::{ApiResponse, ApiResult, BearerToken};

/// GET /api/clinics/:clinicId
pub async fn clinic_get(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Clinic> {
    let Path(clinic_id) = path?;
    let caller = state.profiles().caller(token.as_deref()).await?;
    Ok(ApiResponse::success(state.tenants().clinic(&caller, clinic_id).await?))
}

/// PATCH /api/clinics/:clinicId - systemStatus, forwardingNumber, voice, phoneNumber
pub async fn clinic_patch(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ClinicChanges>, JsonRejection>,
) -> ApiResult<Clinic> {
    let Path(clinic_id) = path?;
    let Json(changes) = payload?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let clinic = state.tenants().update_clinic(&caller, clinic_id, &changes).await?;
    Ok(ApiResponse::success(clinic))
}

#[derive(Debug, Deserialize)]
pub struct CallsQuery {
    pub limit: Option<i64>,
}

/// GET /api/clinics/:clinicId/calls?limit= - newest first, default 50, max 500
pub async fn clinic_calls_get(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<CallsQuery>, QueryRejection>,
) -> ApiResult<Vec<Call>> {
    let Path(clinic_id) = path?;
    let Query(query) = query?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let calls = state.tenants().clinic_calls(&caller, clinic_id, query.limit).await?;
    Ok(ApiResponse::success(calls))
}
