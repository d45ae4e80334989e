// handlers/protected/provision.rs - POST /api/provision/managed-clinic handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, BearerToken};
use crate::services::{ManagedLogin, ManagedLoginRequest};

/**
 * POST /api/provision/managed-clinic - create the managed login of an
 * existing agency clinic
 *
 * Input: `{ "clinicId", "username", "password", "agencyId" }`, all required.
 *
 * Status codes, in evaluation order:
 * - 400 missing field or malformed body
 * - 401 missing bearer token, or token does not resolve
 * - 403 caller has no profile, is not agency_admin, or administers another agency
 * - 403 clinic missing or not managed by `agencyId`
 * - 201 `{ profile, credentials: { email, password } }`
 *
 * The login is created with service credentials; the bearer token only
 * authorizes the call.
 */
pub async fn provision_managed_clinic(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<ManagedLoginRequest>, JsonRejection>,
) -> ApiResult<ManagedLogin> {
    let Json(request) = payload?;
    request.validate()?;

    let caller = state.profiles().caller(token.as_deref()).await?;
    let login = state.provisioning().provision_managed_login(&caller, &request).await?;
    Ok(ApiResponse::created(login))
}

#[cfg(test)]
mod tests {
    use crate::testing::{FailingStore, TestContext};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn duplicate_profile_is_conflict_and_drops_login() {
        let ctx = TestContext::with_store(FailingStore::conflicting_profile_insert());
        let agency = ctx.seed_agency("Acme Dental Group").await;
        let clinic = ctx.seed_managed_clinic(&agency, "Downtown").await;
        let users_before = ctx.identity.user_count().await;

        let (status, _) = ctx
            .post_json(
                "/api/provision/managed-clinic",
                Some(&agency.token),
                json!({"clinicId": clinic.id, "agencyId": agency.agency.id, "username": "downtown", "password": "s3cret"}),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(ctx.identity.user_count().await, users_before);
        assert_eq!(ctx.store.profile_count().await, 1);
        assert_eq!(ctx.store.clinic_count().await, 1);
    }
}
