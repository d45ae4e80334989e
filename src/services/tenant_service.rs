use std::sync::Arc;
use uuid::Uuid;

use crate::access::Capability;
use crate::database::models::{Agency, AgencyChanges, Call, Clinic, ClinicChanges};
use crate::database::TenantStore;

use super::authorization::Caller;
use super::error::ServiceError;

pub const DEFAULT_CALL_LIMIT: i64 = 50;
pub const MAX_CALL_LIMIT: i64 = 500;

/// Clamp a requested call-log page size into `1..=MAX_CALL_LIMIT`
pub fn call_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(DEFAULT_CALL_LIMIT).clamp(1, MAX_CALL_LIMIT)
}

/// Reads and settings changes on agencies and clinics
pub struct TenantService {
    store: Arc<dyn TenantStore>,
}

impl TenantService {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self { store }
    }

    pub async fn agency(&self, caller: &Caller, agency_id: Uuid) -> Result<Agency, ServiceError> {
        caller.require_agency(agency_id, Capability::AgencyWorkspace)?;
        self.store
            .get_agency(agency_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Agency not found"))
    }

    pub async fn update_agency(&self, caller: &Caller, agency_id: Uuid, changes: &AgencyChanges) -> Result<Agency, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::validation("No changes supplied"));
        }
        if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ServiceError::validation("Agency name cannot be empty"));
        }
        caller.require_agency(agency_id, Capability::AgencyWorkspace)?;

        let agency = self
            .store
            .update_agency(agency_id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Agency not found"))?;
        tracing::info!("Agency {} settings updated by {}", agency_id, caller.identity.id);
        Ok(agency)
    }

    pub async fn agency_clinics(&self, caller: &Caller, agency_id: Uuid) -> Result<Vec<Clinic>, ServiceError> {
        caller.require_agency(agency_id, Capability::AgencyWorkspace)?;
        Ok(self.store.list_agency_clinics(agency_id).await?)
    }

    pub async fn clinic(&self, caller: &Caller, clinic_id: Uuid) -> Result<Clinic, ServiceError> {
        caller.require_profile()?;
        let clinic = self.store.get_clinic(clinic_id).await?;

        match clinic {
            Some(clinic) if caller.can_manage_clinic(&clinic) => Ok(clinic),
            _ => {
                tracing::warn!("Caller {} denied access to clinic {}", caller.identity.id, clinic_id);
                Err(ServiceError::forbidden("Forbidden"))
            }
        }
    }

    pub async fn update_clinic(&self, caller: &Caller, clinic_id: Uuid, changes: &ClinicChanges) -> Result<Clinic, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::validation("No changes supplied"));
        }
        self.clinic(caller, clinic_id).await?;

        let clinic = self
            .store
            .update_clinic(clinic_id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("Clinic not found"))?;
        tracing::info!("Clinic {} settings updated by {}", clinic_id, caller.identity.id);
        Ok(clinic)
    }

    pub async fn clinic_calls(&self, caller: &Caller, clinic_id: Uuid, limit: Option<i64>) -> Result<Vec<Call>, ServiceError> {
        self.clinic(caller, clinic_id).await?;
        Ok(self.store.list_clinic_calls(clinic_id, call_limit(limit)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;
    use crate::types::SystemStatus;

    #[test]
    fn call_limit_is_clamped() {
        assert_eq!(call_limit(None), 50);
        assert_eq!(call_limit(Some(0)), 1);
        assert_eq!(call_limit(Some(10_000)), 500);
        assert_eq!(call_limit(Some(20)), 20);
    }

    #[tokio::test]
    async fn agency_sees_only_its_clinics() {
        let ctx = TestContext::new();
        let agency = ctx.seed_agency("Acme Dental Group").await;
        let other = ctx.seed_agency("Other Group").await;
        let mine = ctx.seed_managed_clinic(&agency, "Downtown").await;
        let theirs = ctx.seed_managed_clinic(&other, "Uptown").await;
        let caller = ctx.caller(&agency.token).await;
        let service = ctx.state.tenants();

        let clinics = service.agency_clinics(&caller, agency.agency.id).await.unwrap();
        assert_eq!(clinics.iter().map(|c| c.id).collect::<Vec<_>>(), vec![mine.id]);

        assert!(service.clinic(&caller, mine.id).await.is_ok());
        assert!(matches!(service.clinic(&caller, theirs.id).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(service.agency_clinics(&caller, other.agency.id).await, Err(ServiceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn managed_login_can_pause_its_clinic() {
        let ctx = TestContext::new();
        let agency = ctx.seed_agency("Acme Dental Group").await;
        let login = ctx.seed_managed_login(&agency, "downtown", "pw").await;
        let caller = ctx.caller(&login.token).await;

        let changes = ClinicChanges { system_status: Some(SystemStatus::Paused), ..Default::default() };
        let clinic = ctx.state.tenants().update_clinic(&caller, login.clinic.id, &changes).await.unwrap();
        assert_eq!(clinic.system_status, SystemStatus::Paused);

        let err = ctx
            .state
            .tenants()
            .update_clinic(&caller, login.clinic.id, &ClinicChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn agency_branding_update() {
        let ctx = TestContext::new();
        let agency = ctx.seed_agency("Acme Dental Group").await;
        let caller = ctx.caller(&agency.token).await;

        let changes = AgencyChanges { brand_color: Some("#0F172A".to_string()), ..Default::default() };
        let updated = ctx.state.tenants().update_agency(&caller, agency.agency.id, &changes).await.unwrap();
        assert_eq!(updated.brand_color.as_deref(), Some("#0F172A"));
        assert_eq!(updated.name, "Acme Dental Group");
    }

    #[tokio::test]
    async fn calls_are_listed_newest_first() {
        let ctx = TestContext::new();
        let clinic = ctx.seed_independent_clinic("owner@brightsmile.com", "Bright Smile Dental").await;
        let older = ctx.seed_call(clinic.clinic.id, chrono::Duration::hours(2)).await;
        let newer = ctx.seed_call(clinic.clinic.id, chrono::Duration::minutes(5)).await;
        let caller = ctx.caller(&clinic.token).await;

        let calls = ctx.state.tenants().clinic_calls(&caller, clinic.clinic.id, None).await.unwrap();
        assert_eq!(calls.iter().map(|c| c.id).collect::<Vec<_>>(), vec![newer.id, older.id]);

        let calls = ctx.state.tenants().clinic_calls(&caller, clinic.clinic.id, Some(1)).await.unwrap();
        assert_eq!(calls.len(), 1);
    }
}
