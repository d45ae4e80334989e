use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Agency, AgencyChanges, Call, Clinic, ClinicChanges, NewClinic, OwnerKey, Profile, Subscription,
    SubscriptionUpsert,
};

/// Result of removing a clinic: the managed-clinic profiles that lost access
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedClinic {
    pub clinic: Clinic,
    pub revoked_profiles: Vec<Uuid>,
}

/// Datastore operations the services depend on.
///
/// Implemented by `PgTenantStore` against Postgres and by `MemoryTenantStore`
/// for tests and local demos. Duplicate primary keys surface as
/// `DatabaseError::Conflict`; nothing here retries.
#[async_trait]
pub trait TenantStore: Send + Sync {
    // profiles
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError>;
    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, DatabaseError>;

    // agencies
    async fn get_agency(&self, id: Uuid) -> Result<Option<Agency>, DatabaseError>;
    /// Insert an agency and its admin profile in one transaction
    async fn insert_agency_with_admin(&self, agency: &Agency, admin: &Profile) -> Result<(Agency, Profile), DatabaseError>;
    async fn update_agency(&self, id: Uuid, changes: &AgencyChanges) -> Result<Option<Agency>, DatabaseError>;

    // clinics
    async fn get_clinic(&self, id: Uuid) -> Result<Option<Clinic>, DatabaseError>;
    async fn insert_clinic(&self, clinic: &NewClinic) -> Result<Clinic, DatabaseError>;
    /// Insert a self-serve clinic and its owner profile in one transaction
    async fn insert_clinic_with_profile(&self, clinic: &NewClinic, profile: &Profile) -> Result<(Clinic, Profile), DatabaseError>;
    async fn update_clinic(&self, id: Uuid, changes: &ClinicChanges) -> Result<Option<Clinic>, DatabaseError>;
    /// Newest first
    async fn list_agency_clinics(&self, agency_id: Uuid) -> Result<Vec<Clinic>, DatabaseError>;
    /// Delete a clinic and every profile pointing at it; `None` if absent
    async fn remove_clinic(&self, id: Uuid) -> Result<Option<RemovedClinic>, DatabaseError>;

    // calls
    /// Newest first
    async fn list_clinic_calls(&self, clinic_id: Uuid, limit: i64) -> Result<Vec<Call>, DatabaseError>;

    // subscriptions
    async fn get_subscription(&self, key: OwnerKey) -> Result<Option<Subscription>, DatabaseError>;
    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> Result<Subscription, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
