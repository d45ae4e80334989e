use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::jwt::{generate_jwt, validate_jwt, Claims};
use super::{Identity, IdentityError, IdentityProvider, NewIdentity, Session};
use crate::types::Role;

struct MemoryUser {
    email: String,
    password_hash: String,
    role: Role,
}

impl MemoryUser {
    fn identity(&self, id: Uuid) -> Identity {
        Identity { id, email: Some(self.email.clone()), role_hint: Some(self.role) }
    }
}

/// Identity provider kept in process memory, issuing HS256 tokens shaped like
/// Supabase access tokens. Used by tests and by the server when
/// `IDENTITY_BACKEND=memory`.
pub struct MemoryIdentityProvider {
    users: RwLock<HashMap<Uuid, MemoryUser>>,
    secret: String,
    expiry_hours: u64,
}

impl MemoryIdentityProvider {
    pub fn new(secret: impl Into<String>, expiry_hours: u64) -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            secret: secret.into(),
            expiry_hours,
        }
    }

    /// Mint an access token for an existing user without a password check
    pub async fn issue_token(&self, user_id: Uuid) -> Result<String, IdentityError> {
        let users = self.users.read().await;
        let user = users.get(&user_id).ok_or(IdentityError::InvalidCredentials)?;
        self.token_for(user_id, user)
    }

    pub async fn user_exists(&self, user_id: Uuid) -> bool {
        self.users.read().await.contains_key(&user_id)
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    fn token_for(&self, user_id: Uuid, user: &MemoryUser) -> Result<String, IdentityError> {
        let claims = Claims::new(user_id, Some(user.email.clone()), json!({ "role": user.role }), self.expiry_hours);
        Ok(generate_jwt(&claims, &self.secret)?)
    }
}

fn hash_password(user_id: Uuid, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Identity, IdentityError> {
        let claims = validate_jwt(token, &self.secret)?;
        let users = self.users.read().await;
        // tokens of deleted users stop working immediately
        let user = users
            .get(&claims.sub)
            .ok_or_else(|| IdentityError::InvalidToken("user no longer exists".to_string()))?;
        Ok(user.identity(claims.sub))
    }

    async fn create_user(&self, request: &NewIdentity) -> Result<Identity, IdentityError> {
        let email = request.email.trim().to_ascii_lowercase();
        if request.password.is_empty() {
            return Err(IdentityError::Rejected("Password is required".to_string()));
        }

        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(IdentityError::AlreadyRegistered(email));
        }

        let id = Uuid::new_v4();
        let user = MemoryUser {
            email,
            password_hash: hash_password(id, &request.password),
            role: request.role,
        };
        let identity = user.identity(id);
        users.insert(id, user);
        Ok(identity)
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        self.users.write().await.remove(&user_id);
        Ok(())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let email = email.trim().to_ascii_lowercase();
        let users = self.users.read().await;
        let (id, user) = users
            .iter()
            .find(|(_, u)| u.email == email)
            .ok_or(IdentityError::InvalidCredentials)?;

        if user.password_hash != hash_password(*id, password) {
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(Session {
            access_token: self.token_for(*id, user)?,
            expires_in: (self.expiry_hours * 3600) as i64,
            identity: user.identity(*id),
        })
    }
}
