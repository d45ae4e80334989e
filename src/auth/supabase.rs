use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use super::jwt::validate_jwt;
use super::{Identity, IdentityError, IdentityProvider, NewIdentity, Session};
use crate::config::IdentityConfig;

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
    #[serde(default)]
    app_metadata: Value,
}

impl From<UserPayload> for Identity {
    fn from(user: UserPayload) -> Self {
        Identity::from_metadata(user.id, user.email, &user.app_metadata, &user.user_metadata)
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    expires_in: i64,
    user: UserPayload,
}

/// Supabase Auth (GoTrue) over its REST API.
///
/// Token checks use the anon key, or the project JWT secret when one is
/// configured so no round trip is needed. User creation and deletion use the
/// service-role key and never the caller's token.
pub struct SupabaseIdentityProvider {
    client: Client,
    base_url: Url,
    anon_key: String,
    service_role_key: String,
    jwt_secret: Option<String>,
}

impl SupabaseIdentityProvider {
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let raw_url = config.supabase_url.as_deref().ok_or(IdentityError::NotConfigured("SUPABASE_URL"))?;
        let anon_key = config.anon_key.clone().ok_or(IdentityError::NotConfigured("SUPABASE_ANON_KEY"))?;
        let service_role_key = config
            .service_role_key
            .clone()
            .ok_or(IdentityError::NotConfigured("SUPABASE_SERVICE_ROLE"))?;

        // Url::join drops the last path segment unless the base ends in '/'
        let mut base_url = Url::parse(raw_url).map_err(|_| IdentityError::NotConfigured("SUPABASE_URL"))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            anon_key,
            service_role_key,
            jwt_secret: config.jwt_secret.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|_| IdentityError::NotConfigured("SUPABASE_URL"))
    }

    fn with_service_role(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn verify_token(&self, token: &str) -> Result<Identity, IdentityError> {
        if let Some(secret) = &self.jwt_secret {
            return Ok(validate_jwt(token, secret)?.into());
        }

        let response = self
            .client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<UserPayload>().await?.into()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(IdentityError::InvalidToken(error_message(response).await))
            }
            _ => Err(upstream_error(response).await),
        }
    }

    async fn create_user(&self, request: &NewIdentity) -> Result<Identity, IdentityError> {
        let body = json!({
            "email": request.email,
            "password": request.password,
            "email_confirm": true,
            "user_metadata": { "role": request.role },
            "app_metadata": { "role": request.role },
        });

        let response = self
            .with_service_role(self.client.post(self.endpoint("auth/v1/admin/users")?))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<UserPayload>().await?.into()),
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => {
                let message = error_message(response).await;
                if is_duplicate_email(&message) {
                    Err(IdentityError::AlreadyRegistered(request.email.clone()))
                } else {
                    Err(IdentityError::Rejected(message))
                }
            }
            _ => Err(upstream_error(response).await),
        }
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let response = self
            .with_service_role(self.client.delete(self.endpoint(&format!("auth/v1/admin/users/{}", user_id))?))
            .send()
            .await?;

        // already gone counts as deleted
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            Ok(())
        } else {
            Err(upstream_error(response).await)
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let token = response.json::<TokenPayload>().await?;
                Ok(Session {
                    access_token: token.access_token,
                    expires_in: token.expires_in,
                    identity: token.user.into(),
                })
            }
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => Err(IdentityError::InvalidCredentials),
            _ => Err(upstream_error(response).await),
        }
    }
}

/// Pull a human-readable message out of a GoTrue error body
async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => ["msg", "message", "error_description", "error_code", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()),
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    }
}

async fn upstream_error(response: Response) -> IdentityError {
    let status = response.status().as_u16();
    let message = error_message(response).await;
    tracing::error!("Identity provider error {}: {}", status, message);
    IdentityError::Upstream { status, message }
}

fn is_duplicate_email(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("already been registered") || message.contains("email_exists") || message.contains("already registered")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn supabase_config() -> IdentityConfig {
        let mut config = AppConfig::in_memory().identity;
        config.supabase_url = Some("https://project.supabase.co".to_string());
        config.anon_key = Some("anon".to_string());
        config.service_role_key = Some("service".to_string());
        config
    }

    #[test]
    fn requires_all_credentials() {
        let mut config = supabase_config();
        config.service_role_key = None;
        assert!(matches!(
            SupabaseIdentityProvider::from_config(&config),
            Err(IdentityError::NotConfigured("SUPABASE_SERVICE_ROLE"))
        ));
    }

    #[test]
    fn endpoints_keep_base_path() {
        let mut config = supabase_config();
        config.supabase_url = Some("http://localhost:54321/proxy".to_string());
        let provider = SupabaseIdentityProvider::from_config(&config).unwrap();
        assert_eq!(
            provider.endpoint("auth/v1/user").unwrap().as_str(),
            "http://localhost:54321/proxy/auth/v1/user"
        );
    }

    #[tokio::test]
    async fn verifies_locally_with_jwt_secret() {
        let provider = SupabaseIdentityProvider::from_config(&supabase_config()).unwrap();
        let claims = super::super::jwt::Claims::new(Uuid::new_v4(), None, json!({"role": "agency_admin"}), 1);
        let token = super::super::jwt::generate_jwt(&claims, "in-memory-development-secret").unwrap();

        let identity = provider.verify_token(&token).await.unwrap();
        assert_eq!(identity.id, claims.sub);
        assert!(matches!(provider.verify_token("garbage").await, Err(IdentityError::InvalidToken(_))));
    }

    #[test]
    fn detects_duplicate_email_messages() {
        assert!(is_duplicate_email("A user with this email address has already been registered"));
        assert!(is_duplicate_email("email_exists"));
        assert!(!is_duplicate_email("Password should be at least 6 characters"));
    }
}
