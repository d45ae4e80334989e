use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{login_email, IdentityProvider};
use crate::database::models::Profile;
use crate::database::TenantStore;

use super::authorization::{self, Caller};
use super::error::{require_field, ServiceError};

/// Where a signed-in identity stands with respect to its profile row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProfileStatus {
    Ready { profile: Profile },
    /// Token is valid but provisioning has not written the profile yet
    Provisioning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

pub struct ProfileService {
    store: Arc<dyn TenantStore>,
    identity: Arc<dyn IdentityProvider>,
    managed_email_domain: String,
}

impl ProfileService {
    pub fn new(store: Arc<dyn TenantStore>, identity: Arc<dyn IdentityProvider>, managed_email_domain: impl Into<String>) -> Self {
        Self {
            store,
            identity,
            managed_email_domain: managed_email_domain.into(),
        }
    }

    pub async fn caller(&self, token: Option<&str>) -> Result<Caller, ServiceError> {
        authorization::resolve_caller(self.store.as_ref(), self.identity.as_ref(), token).await
    }

    /// Fetch the profile for an identity id
    pub async fn resolve_profile(&self, identity_id: Uuid) -> Result<Profile, ServiceError> {
        self.store
            .get_profile(identity_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Profile not found"))
    }

    pub async fn status(&self, token: Option<&str>) -> Result<ProfileStatus, ServiceError> {
        let caller = self.caller(token).await?;
        Ok(match caller.profile {
            Some(profile) => ProfileStatus::Ready { profile },
            None => {
                tracing::info!("Identity {} has no profile yet", caller.identity.id);
                ProfileStatus::Provisioning
            }
        })
    }

    /// Password sign-in through the identity provider
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResult, ServiceError> {
        let password = require_field(&request.password, "password")?;
        let email = match (&request.email, &request.username) {
            (Some(email), _) if !email.trim().is_empty() => email.trim().to_string(),
            (_, Some(username)) if !username.trim().is_empty() => login_email(username, &self.managed_email_domain),
            _ => return Err(ServiceError::validation("Missing email or username")),
        };

        let session = self.identity.sign_in(&email, password).await?;
        let profile = self.store.get_profile(session.identity.id).await?;
        tracing::info!("Identity {} signed in", session.identity.id);

        Ok(LoginResult {
            access_token: session.access_token,
            expires_in: session.expires_in,
            profile,
        })
    }
}
