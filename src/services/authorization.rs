//! Caller resolution and the server-side ownership checks.
//!
//! Every protected operation runs the same ladder: bearer token present,
//! token resolves, profile row exists, profile role holds the capability,
//! profile tenant id matches the requested tenant. The first failing rung
//! decides the status code.

use uuid::Uuid;

use crate::access::Capability;
use crate::auth::{Identity, IdentityError, IdentityProvider};
use crate::database::models::{Clinic, OwnerKey, Profile};
use crate::database::TenantStore;
use crate::types::{OwnerType, Role};

use super::error::ServiceError;

/// The authenticated caller of a request and its stored profile, if any
#[derive(Debug, Clone)]
pub struct Caller {
    pub identity: Identity,
    pub profile: Option<Profile>,
}

/// Resolve a bearer token to an identity. Missing and unresolvable tokens are
/// both authentication failures; provider outages are not.
pub async fn authenticate(identity: &dyn IdentityProvider, token: Option<&str>) -> Result<Identity, ServiceError> {
    let token = token.ok_or_else(|| ServiceError::Unauthenticated("Missing bearer token".to_string()))?;

    match identity.verify_token(token).await {
        Ok(identity) => Ok(identity),
        Err(IdentityError::InvalidToken(reason)) => {
            tracing::warn!("Rejected bearer token: {}", reason);
            Err(ServiceError::Unauthenticated("Invalid token".to_string()))
        }
        Err(other) => Err(other.into()),
    }
}

/// Authenticate and load the caller's profile in one step
pub async fn resolve_caller(
    store: &dyn TenantStore,
    identity: &dyn IdentityProvider,
    token: Option<&str>,
) -> Result<Caller, ServiceError> {
    let identity = authenticate(identity, token).await?;
    let profile = store.get_profile(identity.id).await?;
    Ok(Caller { identity, profile })
}

impl Caller {
    pub fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    pub fn require_profile(&self) -> Result<&Profile, ServiceError> {
        self.profile.as_ref().ok_or_else(|| {
            tracing::warn!("Caller {} has no profile", self.identity.id);
            ServiceError::forbidden("Profile not found")
        })
    }

    /// Agency admin acting on its own agency
    pub fn require_agency(&self, agency_id: Uuid, capability: Capability) -> Result<&Profile, ServiceError> {
        let profile = self.require_profile()?;
        if !profile.role.can(capability) || profile.agency_id != Some(agency_id) {
            tracing::warn!(
                "Caller {} ({}) denied {:?} on agency {}",
                profile.id,
                profile.role,
                capability,
                agency_id
            );
            return Err(ServiceError::forbidden("Forbidden"));
        }
        Ok(profile)
    }

    /// Whether the caller may read or change a clinic: its own clinic login,
    /// or the admin of the agency that manages it
    pub fn can_manage_clinic(&self, clinic: &Clinic) -> bool {
        let Some(profile) = &self.profile else {
            return false;
        };

        if profile.role.can(Capability::ClinicWorkspace) {
            return profile.clinic_id == Some(clinic.id);
        }
        if profile.role.can(Capability::AgencyWorkspace) {
            return profile.agency_id.map_or(false, |agency_id| clinic.belongs_to(agency_id));
        }
        false
    }

    /// Billing owner check shared by cancel and subscription reads
    pub fn require_billing_owner(&self, key: OwnerKey) -> Result<&Profile, ServiceError> {
        let profile = self.require_profile()?;

        if !profile.role.can(key.owner_type.billing_capability()) {
            let message = match key.owner_type {
                OwnerType::Agency => "Only agencies may manage their subscription",
                OwnerType::Clinic => "Only independent clinics may manage their plan",
            };
            tracing::warn!("Caller {} ({}) denied billing for {}", profile.id, profile.role, key.owner_type);
            return Err(ServiceError::forbidden(message));
        }

        let owned = match key.owner_type {
            OwnerType::Agency => profile.agency_id,
            OwnerType::Clinic => profile.clinic_id,
        };
        if owned != Some(key.owner_id) {
            tracing::warn!("Caller {} billing owner mismatch for {} {}", profile.id, key.owner_type, key.owner_id);
            return Err(ServiceError::forbidden("Owner mismatch"));
        }

        Ok(profile)
    }
}
