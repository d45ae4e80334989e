//! In-memory fixtures for unit tests.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::{IdentityProvider, MemoryIdentityProvider, NewIdentity};
use crate::config::AppConfig;
use crate::database::models::{
    Agency, AgencyChanges, Call, Clinic, ClinicChanges, NewClinic, OwnerKey, Profile, Subscription,
    SubscriptionUpsert,
};
use crate::database::{DatabaseError, MemoryTenantStore, RemovedClinic, TenantStore};
use crate::services::Caller;
use crate::types::{CallStatus, Role};

/// Test utilities for seeding tenants and logins
pub struct TestContext {
    pub state: AppState,
    /// Backing tables; seeding goes straight here even when `state.store` injects failures
    pub store: Arc<MemoryTenantStore>,
    pub identity: Arc<MemoryIdentityProvider>,
}

#[derive(Debug, Clone)]
pub struct SeededAgency {
    pub agency: Agency,
    pub admin: Profile,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct SeededLogin {
    pub clinic: Clinic,
    pub profile: Profile,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryTenantStore::new());
        Self::build(store.clone(), store)
    }

    /// Context whose services see a store with injected write failures
    pub fn with_store(failing: FailingStore) -> Self {
        let store = failing.inner.clone();
        Self::build(Arc::new(failing), store)
    }

    fn build(service_store: Arc<dyn TenantStore>, store: Arc<MemoryTenantStore>) -> Self {
        let config = AppConfig::in_memory();
        let identity = Arc::new(MemoryIdentityProvider::new(
            config.identity.jwt_secret.clone().unwrap_or_default(),
            config.identity.jwt_expiry_hours,
        ));
        let state = AppState::new(service_store, identity.clone(), config);
        Self { state, store, identity }
    }

    /// Run a request through the full router
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = crate::app::router(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    pub async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    pub async fn caller(&self, token: &str) -> Caller {
        self.state.profiles().caller(Some(token)).await.unwrap()
    }

    /// A valid login that has not been provisioned yet
    pub async fn login_without_profile(&self, email: &str) -> (Uuid, String) {
        let identity = self.create_identity(email, Role::IndependentClinic).await;
        let token = self.identity.issue_token(identity).await.unwrap();
        (identity, token)
    }

    pub async fn seed_independent_clinic_for(&self, user_id: Uuid, name: &str) -> Clinic {
        let clinic = NewClinic::independent(name);
        let profile = Profile::independent_clinic(user_id, clinic.id);
        self.store.insert_clinic_with_profile(&clinic, &profile).await.unwrap().0
    }

    pub async fn seed_independent_clinic(&self, email: &str, name: &str) -> SeededLogin {
        let (user_id, token) = self.login_without_profile(email).await;
        let clinic = self.seed_independent_clinic_for(user_id, name).await;
        let profile = self.store.get_profile(user_id).await.unwrap().unwrap();
        SeededLogin { clinic, profile, token }
    }

    pub async fn seed_agency(&self, name: &str) -> SeededAgency {
        let email = format!("admin-{}@agency.test", Uuid::new_v4().simple());
        let user_id = self.create_identity(&email, Role::AgencyAdmin).await;
        let agency = Agency::new(name, user_id);
        let (agency, admin) = self
            .store
            .insert_agency_with_admin(&agency, &Profile::agency_admin(user_id, agency.id))
            .await
            .unwrap();
        let token = self.identity.issue_token(user_id).await.unwrap();
        SeededAgency { agency, admin, token }
    }

    pub async fn seed_managed_clinic(&self, agency: &SeededAgency, name: &str) -> Clinic {
        self.store
            .insert_clinic(&NewClinic::managed(name, agency.agency.id))
            .await
            .unwrap()
    }

    pub async fn seed_managed_login(&self, agency: &SeededAgency, username: &str, password: &str) -> SeededLogin {
        let clinic = self.seed_managed_clinic(agency, &format!("{} clinic", username)).await;
        let email = crate::auth::login_email(username, &self.state.config.identity.managed_email_domain);
        let user_id = self
            .identity
            .create_user(&NewIdentity { email, password: password.to_string(), role: Role::ManagedClinic })
            .await
            .unwrap()
            .id;
        let profile = self
            .store
            .insert_profile(&Profile::managed_clinic(user_id, clinic.id, agency.agency.id))
            .await
            .unwrap();
        let token = self.identity.issue_token(user_id).await.unwrap();
        SeededLogin { clinic, profile, token }
    }

    /// Record a call that happened `ago` before now
    pub async fn seed_call(&self, clinic_id: Uuid, ago: chrono::Duration) -> Call {
        let at = Utc::now() - ago;
        let call = Call {
            id: Uuid::new_v4(),
            clinic_id,
            caller: "+15550123".to_string(),
            timestamp: at,
            duration_seconds: Some(95),
            status: CallStatus::Answered,
            summary: Some("Booked a cleaning".to_string()),
            transcript: None,
            recording_url: None,
            sentiment_score: None,
            created_at: at,
            updated_at: at,
        };
        self.store.insert_call(call.clone()).await;
        call
    }

    async fn create_identity(&self, email: &str, role: Role) -> Uuid {
        self.identity
            .create_user(&NewIdentity { email: email.to_string(), password: "password".to_string(), role })
            .await
            .unwrap()
            .id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    ProfileInsert,
    ProfileConflict,
    CombinedInsert,
    SubscriptionUpsert,
}

/// `TenantStore` wrapper that fails one kind of write
pub struct FailingStore {
    inner: Arc<MemoryTenantStore>,
    failure: Failure,
}

impl FailingStore {
    fn new(failure: Failure) -> Self {
        Self { inner: Arc::new(MemoryTenantStore::new()), failure }
    }

    pub fn failing_profile_insert() -> Self {
        Self::new(Failure::ProfileInsert)
    }

    /// Profile inserts hit a duplicate key
    pub fn conflicting_profile_insert() -> Self {
        Self::new(Failure::ProfileConflict)
    }

    pub fn failing_combined_insert() -> Self {
        Self::new(Failure::CombinedInsert)
    }

    pub fn failing_subscription_upsert() -> Self {
        Self::new(Failure::SubscriptionUpsert)
    }

    fn injected(&self, at: Failure) -> Result<(), DatabaseError> {
        match self.failure {
            Failure::ProfileConflict if at == Failure::ProfileInsert => {
                Err(DatabaseError::Conflict("duplicate key violates profiles_pkey".to_string()))
            }
            failure if failure == at => Err(DatabaseError::InvalidRow("injected failure".to_string())),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TenantStore for FailingStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        self.inner.get_profile(id).await
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, DatabaseError> {
        self.injected(Failure::ProfileInsert)?;
        self.inner.insert_profile(profile).await
    }

    async fn get_agency(&self, id: Uuid) -> Result<Option<Agency>, DatabaseError> {
        self.inner.get_agency(id).await
    }

    async fn insert_agency_with_admin(&self, agency: &Agency, admin: &Profile) -> Result<(Agency, Profile), DatabaseError> {
        self.inner.insert_agency_with_admin(agency, admin).await
    }

    async fn update_agency(&self, id: Uuid, changes: &AgencyChanges) -> Result<Option<Agency>, DatabaseError> {
        self.inner.update_agency(id, changes).await
    }

    async fn get_clinic(&self, id: Uuid) -> Result<Option<Clinic>, DatabaseError> {
        self.inner.get_clinic(id).await
    }

    async fn insert_clinic(&self, clinic: &NewClinic) -> Result<Clinic, DatabaseError> {
        self.inner.insert_clinic(clinic).await
    }

    async fn insert_clinic_with_profile(&self, clinic: &NewClinic, profile: &Profile) -> Result<(Clinic, Profile), DatabaseError> {
        self.injected(Failure::CombinedInsert)?;
        self.inner.insert_clinic_with_profile(clinic, profile).await
    }

    async fn update_clinic(&self, id: Uuid, changes: &ClinicChanges) -> Result<Option<Clinic>, DatabaseError> {
        self.inner.update_clinic(id, changes).await
    }

    async fn list_agency_clinics(&self, agency_id: Uuid) -> Result<Vec<Clinic>, DatabaseError> {
        self.inner.list_agency_clinics(agency_id).await
    }

    async fn remove_clinic(&self, id: Uuid) -> Result<Option<RemovedClinic>, DatabaseError> {
        self.inner.remove_clinic(id).await
    }

    async fn list_clinic_calls(&self, clinic_id: Uuid, limit: i64) -> Result<Vec<Call>, DatabaseError> {
        self.inner.list_clinic_calls(clinic_id, limit).await
    }

    async fn get_subscription(&self, key: OwnerKey) -> Result<Option<Subscription>, DatabaseError> {
        self.inner.get_subscription(key).await
    }

    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> Result<Subscription, DatabaseError> {
        self.injected(Failure::SubscriptionUpsert)?;
        self.inner.upsert_subscription(upsert).await
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.inner.health_check().await
    }
}
