// handlers/protected/agency.rs - agency settings and clinic management

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
use crate::database::models::{Agency, AgencyChanges, Clinic};
use crate::middleware::{ApiResponse, ApiResult, BearerToken};
use crate::services::{ManagedClinic, ManagedClinicRequest};

/// GET /api/agencies/:agencyId
pub async fn agency_get(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Agency> {
    let Path(agency_id) = path?;
    let caller = state.profiles().caller(token.as_deref()).await?;
    Ok(ApiResponse::success(state.tenants().agency(&caller, agency_id).await?))
}

/// PATCH /api/agencies/:agencyId - name, logoUrl, brandColor, systemStatus
pub async fn agency_patch(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AgencyChanges>, JsonRejection>,
) -> ApiResult<Agency> {
    let Path(agency_id) = path?;
    let Json(changes) = payload?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let agency = state.tenants().update_agency(&caller, agency_id, &changes).await?;
    Ok(ApiResponse::success(agency))
}

/// GET /api/agencies/:agencyId/clinics - newest first
pub async fn agency_clinics_get(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Vec<Clinic>> {
    let Path(agency_id) = path?;
    let caller = state.profiles().caller(token.as_deref()).await?;
    Ok(ApiResponse::success(state.tenants().agency_clinics(&caller, agency_id).await?))
}

/**
 * POST /api/agencies/:agencyId/clinics - create a managed clinic and its login
 *
 * Input: `{ "clinicName", "username", "password", "phoneNumber"?, "ghlLocationId"? }`
 *
 * Output: 201 `{ clinic, profile, credentials }`. When the login cannot be
 * created the clinic row is deleted again and 500 PROVISIONING_FAILED (or
 * 409 for a taken email) is returned.
 */
pub async fn agency_clinics_post(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ManagedClinicRequest>, JsonRejection>,
) -> ApiResult<ManagedClinic> {
    let Path(agency_id) = path?;
    let Json(request) = payload?;
    request.validate()?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let created = state.provisioning().create_managed_clinic(&caller, agency_id, &request).await?;
    Ok(ApiResponse::created(created))
}

/// DELETE /api/agencies/:agencyId/clinics/:clinicId
pub async fn agency_clinic_delete(
    State(state): State<AppState>,
    token: BearerToken,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<Value> {
    let Path((agency_id, clinic_id)) = path?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let removed = state.provisioning().remove_managed_clinic(&caller, agency_id, clinic_id).await?;
    Ok(ApiResponse::success(json!({
        "removed": removed.clinic.id,
        "revokedProfiles": removed.revoked_profiles,
    })))
}

#[cfg(test)]
mod tests {
    use crate::testing::{FailingStore, TestContext};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn duplicate_profile_is_conflict_and_rolls_back() {
        let ctx = TestContext::with_store(FailingStore::conflicting_profile_insert());
        let agency = ctx.seed_agency("Acme Dental Group").await;
        let users_before = ctx.identity.user_count().await;

        let (status, body) = ctx
            .post_json(
                &format!("/api/agencies/{}/clinics", agency.agency.id),
                Some(&agency.token),
                json!({"clinicName": "Downtown", "username": "downtown", "password": "s3cret"}),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        assert_eq!(ctx.store.clinic_count().await, 0);
        assert_eq!(ctx.store.profile_count().await, 1);
        assert_eq!(ctx.identity.user_count().await, users_before);
    }
}
