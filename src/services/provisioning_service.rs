use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::access::Capability;
use crate::auth::{login_email, Identity, IdentityProvider, NewIdentity};
use crate::database::models::{Agency, Clinic, NewClinic, Profile};
use crate::database::{DatabaseError, RemovedClinic, TenantStore};
use crate::types::Role;

use super::authorization::Caller;
use super::error::{require_field, ServiceError};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndependentSignup {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
}

impl IndependentSignup {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require_field(&self.name, "name")?;
        require_field(&self.email, "email")?;
        require_field(&self.password, "password")?;
        Ok(())
    }
}

/// Managed login for a clinic that already exists
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedLoginRequest {
    pub clinic_id: Option<Uuid>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub agency_id: Option<Uuid>,
}

impl ManagedLoginRequest {
    pub fn validate(&self) -> Result<(Uuid, Uuid), ServiceError> {
        let missing = || ServiceError::validation("Missing clinicId, username, password, or agencyId");
        let clinic_id = self.clinic_id.ok_or_else(missing)?;
        let agency_id = self.agency_id.ok_or_else(missing)?;
        require_field(&self.username, "username").map_err(|_| missing())?;
        require_field(&self.password, "password").map_err(|_| missing())?;
        Ok((clinic_id, agency_id))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedClinicRequest {
    pub clinic_name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub ghl_location_id: Option<String>,
}

impl ManagedClinicRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        require_field(&self.clinic_name, "clinicName")?;
        require_field(&self.username, "username")?;
        require_field(&self.password, "password")?;
        Ok(())
    }
}

/// Login details handed back to the agency so it can pass them on
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagedLogin {
    pub profile: Profile,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagedClinic {
    pub clinic: Clinic,
    pub profile: Profile,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedUpClinic {
    pub profile: Profile,
    pub clinic: Clinic,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredAgency {
    pub agency: Agency,
    pub profile: Profile,
}

/// Creates tenants together with their logins.
///
/// Each flow spans the identity provider and the datastore, which share no
/// transaction. When a later step fails the earlier steps are undone with
/// compensating deletes before the error is returned.
pub struct ProvisioningService {
    store: Arc<dyn TenantStore>,
    identity: Arc<dyn IdentityProvider>,
    managed_email_domain: String,
}

impl ProvisioningService {
    pub fn new(store: Arc<dyn TenantStore>, identity: Arc<dyn IdentityProvider>, managed_email_domain: impl Into<String>) -> Self {
        Self {
            store,
            identity,
            managed_email_domain: managed_email_domain.into(),
        }
    }

    /// Self-serve signup of an independent clinic
    pub async fn signup_independent_clinic(&self, request: &IndependentSignup) -> Result<SignedUpClinic, ServiceError> {
        request.validate()?;
        let name = require_field(&request.name, "name")?.trim();
        let email = require_field(&request.email, "email")?.trim();
        let password = require_field(&request.password, "password")?;

        let identity = self
            .identity
            .create_user(&NewIdentity {
                email: email.to_string(),
                password: password.to_string(),
                role: Role::IndependentClinic,
            })
            .await?;

        let clinic = NewClinic::independent(name).with_phone_number(request.phone_number.clone());
        let profile = Profile::independent_clinic(identity.id, clinic.id);

        match self.store.insert_clinic_with_profile(&clinic, &profile).await {
            Ok((clinic, profile)) => {
                tracing::info!("Independent clinic {} signed up by {}", clinic.id, identity.id);
                Ok(SignedUpClinic { profile, clinic })
            }
            Err(err) => {
                tracing::error!("Independent signup for {} failed: {}", email, err);
                self.discard_identity(identity.id).await;
                Err(ServiceError::after_compensation(err))
            }
        }
    }

    /// Give an existing agency clinic its managed login
    pub async fn provision_managed_login(&self, caller: &Caller, request: &ManagedLoginRequest) -> Result<ManagedLogin, ServiceError> {
        let (clinic_id, agency_id) = request.validate()?;
        caller.require_agency(agency_id, Capability::ProvisionClinics)?;

        match self.store.get_clinic(clinic_id).await? {
            Some(clinic) if clinic.belongs_to(agency_id) => {}
            _ => {
                tracing::warn!("Clinic {} is not managed by agency {}", clinic_id, agency_id);
                return Err(ServiceError::forbidden("Clinic does not belong to agency"));
            }
        }

        let username = require_field(&request.username, "username")?;
        let password = require_field(&request.password, "password")?;
        let (profile, credentials) = self.create_managed_login(clinic_id, agency_id, username, password).await?;

        tracing::info!("Provisioned managed login {} for clinic {}", profile.id, clinic_id);
        Ok(ManagedLogin { profile, credentials })
    }

    /// Create a clinic under an agency together with its managed login
    pub async fn create_managed_clinic(
        &self,
        caller: &Caller,
        agency_id: Uuid,
        request: &ManagedClinicRequest,
    ) -> Result<ManagedClinic, ServiceError> {
        request.validate()?;
        caller.require_agency(agency_id, Capability::ProvisionClinics)?;

        let name = require_field(&request.clinic_name, "clinicName")?.trim();
        let username = require_field(&request.username, "username")?;
        let password = require_field(&request.password, "password")?;

        let new_clinic = NewClinic::managed(name, agency_id)
            .with_phone_number(request.phone_number.clone())
            .with_ghl_location(request.ghl_location_id.clone());
        let clinic = self.store.insert_clinic(&new_clinic).await?;

        // read back before handing out a login for it
        match self.store.get_clinic(clinic.id).await {
            Ok(Some(stored)) if stored.belongs_to(agency_id) => {}
            Ok(_) => {
                self.discard_clinic(clinic.id).await;
                return Err(ServiceError::ProvisioningFailed(format!(
                    "clinic {} is not attached to agency {}",
                    clinic.id, agency_id
                )));
            }
            Err(err) => {
                self.discard_clinic(clinic.id).await;
                return Err(ServiceError::after_compensation(err));
            }
        }

        match self.create_managed_login(clinic.id, agency_id, username, password).await {
            Ok((profile, credentials)) => {
                tracing::info!("Agency {} created managed clinic {}", agency_id, clinic.id);
                Ok(ManagedClinic { clinic, profile, credentials })
            }
            Err(err) => {
                self.discard_clinic(clinic.id).await;
                Err(err)
            }
        }
    }

    /// Remove an agency clinic and revoke its managed logins
    pub async fn remove_managed_clinic(&self, caller: &Caller, agency_id: Uuid, clinic_id: Uuid) -> Result<RemovedClinic, ServiceError> {
        caller.require_agency(agency_id, Capability::ProvisionClinics)?;

        match self.store.get_clinic(clinic_id).await? {
            Some(clinic) if clinic.belongs_to(agency_id) => {}
            Some(_) => return Err(ServiceError::forbidden("Clinic does not belong to agency")),
            None => return Err(ServiceError::not_found("Clinic not found")),
        }

        let removed = self
            .store
            .remove_clinic(clinic_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Clinic not found"))?;

        // identities are cleaned up best-effort once the rows are gone
        let deletions = removed.revoked_profiles.iter().map(|id| self.identity.delete_user(*id));
        for (user_id, result) in removed.revoked_profiles.iter().zip(join_all(deletions).await) {
            if let Err(err) = result {
                tracing::error!("Failed to delete identity {} of removed clinic {}: {}", user_id, clinic_id, err);
            }
        }

        tracing::info!(
            "Agency {} removed clinic {} and revoked {} login(s)",
            agency_id,
            clinic_id,
            removed.revoked_profiles.len()
        );
        Ok(removed)
    }

    /// Register an agency with its admin login
    pub async fn register_agency(&self, name: &str, email: &str, password: &str) -> Result<RegisteredAgency, ServiceError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::validation("Missing name, email, or password"));
        }

        let identity = self
            .identity
            .create_user(&NewIdentity {
                email: email.trim().to_string(),
                password: password.to_string(),
                role: Role::AgencyAdmin,
            })
            .await?;

        let agency = Agency::new(name.trim(), identity.id);
        let admin = Profile::agency_admin(identity.id, agency.id);

        match self.store.insert_agency_with_admin(&agency, &admin).await {
            Ok((agency, profile)) => {
                tracing::info!("Registered agency {} owned by {}", agency.id, identity.id);
                Ok(RegisteredAgency { agency, profile })
            }
            Err(err) => {
                tracing::error!("Agency registration for {} failed: {}", email, err);
                self.discard_identity(identity.id).await;
                Err(ServiceError::after_compensation(err))
            }
        }
    }

    /// Steps shared by both managed flows: identity, then profile
    async fn create_managed_login(
        &self,
        clinic_id: Uuid,
        agency_id: Uuid,
        username: &str,
        password: &str,
    ) -> Result<(Profile, Credentials), ServiceError> {
        let email = login_email(username, &self.managed_email_domain);
        let identity: Identity = self
            .identity
            .create_user(&NewIdentity {
                email: email.clone(),
                password: password.to_string(),
                role: Role::ManagedClinic,
            })
            .await?;

        let profile = Profile::managed_clinic(identity.id, clinic_id, agency_id);
        if let Err(err) = self.insert_profile(&profile).await {
            tracing::error!("Managed login {} for clinic {} failed: {}", email, clinic_id, err);
            self.discard_identity(identity.id).await;
            return Err(ServiceError::after_compensation(err));
        }

        let credentials = Credentials {
            email,
            password: password.to_string(),
        };
        Ok((profile, credentials))
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<Profile, DatabaseError> {
        profile
            .validate()
            .map_err(|e| DatabaseError::InvalidRow(e.to_string()))?;
        self.store.insert_profile(profile).await
    }

    async fn discard_identity(&self, user_id: Uuid) {
        match self.identity.delete_user(user_id).await {
            Ok(()) => tracing::warn!("Deleted identity {} after failed provisioning", user_id),
            Err(err) => tracing::error!("Failed to delete orphaned identity {}: {}", user_id, err),
        }
    }

    async fn discard_clinic(&self, clinic_id: Uuid) {
        match self.store.remove_clinic(clinic_id).await {
            Ok(_) => tracing::warn!("Deleted clinic {} after failed provisioning", clinic_id),
            Err(err) => tracing::error!("Failed to delete orphaned clinic {}: {}", clinic_id, err),
        }
    }
}
