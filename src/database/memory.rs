use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Agency, AgencyChanges, Call, Clinic, ClinicChanges, NewClinic, OwnerKey, Profile, Subscription,
    SubscriptionUpsert,
};
use crate::database::repository::{RemovedClinic, TenantStore};

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    agencies: HashMap<Uuid, Agency>,
    clinics: HashMap<Uuid, Clinic>,
    calls: HashMap<Uuid, Call>,
    subscriptions: HashMap<OwnerKey, Subscription>,
}

impl Tables {
    fn check_profile(&self, profile: &Profile) -> Result<(), DatabaseError> {
        if self.profiles.contains_key(&profile.id) {
            return Err(DatabaseError::Conflict(format!("duplicate key violates profiles_pkey ({})", profile.id)));
        }
        if let Some(clinic_id) = profile.clinic_id {
            if !self.clinics.contains_key(&clinic_id) {
                return Err(DatabaseError::InvalidRow(format!("clinic {} does not exist", clinic_id)));
            }
        }
        Ok(())
    }

    fn check_clinic(&self, clinic: &NewClinic) -> Result<(), DatabaseError> {
        if self.clinics.contains_key(&clinic.id) {
            return Err(DatabaseError::Conflict(format!("duplicate key violates clinics_pkey ({})", clinic.id)));
        }
        Ok(())
    }
}

/// In-process `TenantStore` with the same key constraints as the Postgres
/// schema. Multi-row writes validate every row before touching any table,
/// which gives them the all-or-nothing behaviour of a transaction.
#[derive(Default)]
pub struct MemoryTenantStore {
    tables: RwLock<Tables>,
}

impl MemoryTenantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call as the voice platform would
    pub async fn insert_call(&self, call: Call) {
        self.tables.write().await.calls.insert(call.id, call);
    }

    pub async fn clinic_count(&self) -> usize {
        self.tables.read().await.clinics.len()
    }

    pub async fn profile_count(&self) -> usize {
        self.tables.read().await.profiles.len()
    }
}

#[async_trait]
impl TenantStore for MemoryTenantStore {
    async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_profile(profile)?;
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile.clone())
    }

    async fn get_agency(&self, id: Uuid) -> Result<Option<Agency>, DatabaseError> {
        Ok(self.tables.read().await.agencies.get(&id).cloned())
    }

    async fn insert_agency_with_admin(&self, agency: &Agency, admin: &Profile) -> Result<(Agency, Profile), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.agencies.contains_key(&agency.id) {
            return Err(DatabaseError::Conflict(format!("duplicate key violates agencies_pkey ({})", agency.id)));
        }
        tables.check_profile(admin)?;

        tables.agencies.insert(agency.id, agency.clone());
        tables.profiles.insert(admin.id, admin.clone());
        Ok((agency.clone(), admin.clone()))
    }

    async fn update_agency(&self, id: Uuid, changes: &AgencyChanges) -> Result<Option<Agency>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.agencies.get_mut(&id).map(|agency| {
            changes.apply(agency);
            agency.clone()
        }))
    }

    async fn get_clinic(&self, id: Uuid) -> Result<Option<Clinic>, DatabaseError> {
        Ok(self.tables.read().await.clinics.get(&id).cloned())
    }

    async fn insert_clinic(&self, clinic: &NewClinic) -> Result<Clinic, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_clinic(clinic)?;
        let row = clinic.clone().into_clinic();
        tables.clinics.insert(row.id, row.clone());
        Ok(row)
    }

    async fn insert_clinic_with_profile(&self, clinic: &NewClinic, profile: &Profile) -> Result<(Clinic, Profile), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_clinic(clinic)?;
        if tables.profiles.contains_key(&profile.id) {
            return Err(DatabaseError::Conflict(format!("duplicate key violates profiles_pkey ({})", profile.id)));
        }

        let row = clinic.clone().into_clinic();
        tables.clinics.insert(row.id, row.clone());
        tables.profiles.insert(profile.id, profile.clone());
        Ok((row, profile.clone()))
    }

    async fn update_clinic(&self, id: Uuid, changes: &ClinicChanges) -> Result<Option<Clinic>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.clinics.get_mut(&id).map(|clinic| {
            changes.apply(clinic);
            clinic.clone()
        }))
    }

    async fn list_agency_clinics(&self, agency_id: Uuid) -> Result<Vec<Clinic>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut clinics: Vec<Clinic> = tables
            .clinics
            .values()
            .filter(|c| c.belongs_to(agency_id))
            .cloned()
            .collect();
        clinics.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(clinics)
    }

    async fn remove_clinic(&self, id: Uuid) -> Result<Option<RemovedClinic>, DatabaseError> {
        let mut tables = self.tables.write().await;
        let Some(clinic) = tables.clinics.remove(&id) else {
            return Ok(None);
        };

        let revoked_profiles: Vec<Uuid> = tables
            .profiles
            .values()
            .filter(|p| p.clinic_id == Some(id))
            .map(|p| p.id)
            .collect();
        for profile_id in &revoked_profiles {
            tables.profiles.remove(profile_id);
        }
        tables.calls.retain(|_, call| call.clinic_id != id);

        Ok(Some(RemovedClinic { clinic, revoked_profiles }))
    }

    async fn list_clinic_calls(&self, clinic_id: Uuid, limit: i64) -> Result<Vec<Call>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut calls: Vec<Call> = tables
            .calls
            .values()
            .filter(|c| c.clinic_id == clinic_id)
            .cloned()
            .collect();
        calls.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        calls.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(calls)
    }

    async fn get_subscription(&self, key: OwnerKey) -> Result<Option<Subscription>, DatabaseError> {
        Ok(self.tables.read().await.subscriptions.get(&key).cloned())
    }

    async fn upsert_subscription(&self, upsert: &SubscriptionUpsert) -> Result<Subscription, DatabaseError> {
        let mut tables = self.tables.write().await;
        let row = match tables.subscriptions.get_mut(&upsert.key) {
            Some(existing) => {
                upsert.clone().apply(existing);
                existing.clone()
            }
            None => {
                let row = upsert.clone().into_new_row();
                tables.subscriptions.insert(upsert.key, row.clone());
                row
            }
        };
        Ok(row)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
