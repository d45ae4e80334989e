//! Application state and router assembly.

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::auth::{IdentityError, IdentityProvider, MemoryIdentityProvider, SupabaseIdentityProvider};
use crate::config::{AppConfig, IdentityBackend, StoreBackend};
use crate::database::{DatabaseError, DatabaseManager, MemoryTenantStore, PgTenantStore, TenantStore};
use crate::handlers::{protected, public};
use crate::services::{ProfileService, ProvisioningService, SubscriptionService, TenantService};

/// Shared handles injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TenantStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl AppState {
    pub fn new(store: Arc<dyn TenantStore>, identity: Arc<dyn IdentityProvider>, config: AppConfig) -> Self {
        Self {
            store,
            identity,
            config: Arc::new(config),
        }
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.store.clone(), self.identity.clone(), &self.config.identity.managed_email_domain)
    }

    pub fn provisioning(&self) -> ProvisioningService {
        ProvisioningService::new(self.store.clone(), self.identity.clone(), &self.config.identity.managed_email_domain)
    }

    pub fn subscriptions(&self) -> SubscriptionService {
        SubscriptionService::new(self.store.clone())
    }

    pub fn tenants(&self) -> TenantService {
        TenantService::new(self.store.clone())
    }
}

/// Connect the configured store and identity provider
pub async fn build_state(config: AppConfig) -> Result<AppState, StartupError> {
    let store: Arc<dyn TenantStore> = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database).await?;
            if config.database.run_migrations {
                DatabaseManager::migrate(&pool).await?;
            }
            Arc::new(PgTenantStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory datastore; data is lost on restart");
            Arc::new(MemoryTenantStore::new())
        }
    };

    let identity: Arc<dyn IdentityProvider> = match config.identity.backend {
        IdentityBackend::Supabase => Arc::new(SupabaseIdentityProvider::from_config(&config.identity)?),
        IdentityBackend::Memory => {
            tracing::warn!("Using in-memory identity provider");
            let secret = config
                .identity
                .jwt_secret
                .clone()
                .ok_or(IdentityError::NotConfigured("SUPABASE_JWT_SECRET"))?;
            Arc::new(MemoryIdentityProvider::new(secret, config.identity.jwt_expiry_hours))
        }
    };

    Ok(AppState::new(store, identity, config))
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.server.max_request_size_bytes;
    let request_logging = state.config.server.enable_request_logging;

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors);

    let router = if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/login", post(public::login))
        .route("/api/signup/independent-clinic", post(public::signup_independent_clinic))
        .route("/api/webhooks/paddle", post(public::paddle_webhook))
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/me", get(protected::me))
        .route("/api/guard", get(protected::guard))
        .route("/api/provision/managed-clinic", post(protected::provision_managed_clinic))
        .route("/api/subscriptions/cancel", post(protected::cancel_subscription))
        .route("/api/subscriptions/:owner_type/:owner_id", get(protected::show_subscription))
        .route("/api/agencies/:agency_id", get(protected::agency_get).patch(protected::agency_patch))
        .route(
            "/api/agencies/:agency_id/clinics",
            get(protected::agency_clinics_get).post(protected::agency_clinics_post),
        )
        .route("/api/agencies/:agency_id/clinics/:clinic_id", axum::routing::delete(protected::agency_clinic_delete))
        .route("/api/clinics/:clinic_id", get(protected::clinic_get).patch(protected::clinic_patch))
        .route("/api/clinics/:clinic_id/calls", get(protected::clinic_calls_get))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}
