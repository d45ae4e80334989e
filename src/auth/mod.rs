//! Identity provider boundary.
//!
//! Authentication itself (passwords, sessions, token issuance) lives in an
//! external provider. The service only needs to turn a bearer token into an
//! identity id, create and delete logins with service credentials, and relay
//! password sign-in.

pub mod jwt;
pub mod memory;
pub mod supabase;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::types::Role;

pub use memory::MemoryIdentityProvider;
pub use supabase::SupabaseIdentityProvider;

/// An authenticated login as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
    /// Role recorded in the login's metadata at creation time. Only a hint:
    /// authorization always reads the stored profile.
    pub role_hint: Option<Role>,
}

impl Identity {
    /// Build from provider metadata, preferring server-controlled `app_metadata`
    pub fn from_metadata(id: Uuid, email: Option<String>, app_metadata: &Value, user_metadata: &Value) -> Self {
        let role_hint = [app_metadata, user_metadata]
            .into_iter()
            .find_map(|meta| meta.get("role").and_then(Value::as_str))
            .and_then(|role| role.parse().ok());

        Self { id, email, role_hint }
    }
}

impl From<jwt::Claims> for Identity {
    fn from(claims: jwt::Claims) -> Self {
        Identity::from_metadata(claims.sub, claims.email, &claims.app_metadata, &claims.user_metadata)
    }
}

/// Login to create with service credentials
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    pub expires_in: i64,
    pub identity: Identity,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("A user with this email address has already been registered: {0}")]
    AlreadyRegistered(String),

    #[error("Identity provider rejected the request: {0}")]
    Rejected(String),

    #[error("Identity provider not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Identity provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl From<jwt::JwtError> for IdentityError {
    fn from(err: jwt::JwtError) -> Self {
        match err {
            jwt::JwtError::InvalidSecret => IdentityError::NotConfigured("JWT secret"),
            other => IdentityError::InvalidToken(other.to_string()),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer token to the login it was issued for
    async fn verify_token(&self, token: &str) -> Result<Identity, IdentityError>;

    /// Create a confirmed login using service-level credentials
    async fn create_user(&self, request: &NewIdentity) -> Result<Identity, IdentityError>;

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError>;
}

/// Login email for a managed clinic: usernames without `@` get the managed domain
pub fn login_email(username: &str, managed_domain: &str) -> String {
    let username = username.trim();
    if username.contains('@') {
        username.to_string()
    } else {
        format!("{}@{}", username, managed_domain)
    }
}
