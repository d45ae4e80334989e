use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub billing: BillingConfig,
    pub branding: BrandingConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    #[serde(skip_serializing)]
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityBackend {
    Supabase,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub backend: IdentityBackend,
    pub supabase_url: Option<String>,
    #[serde(skip_serializing)]
    pub service_role_key: Option<String>,
    #[serde(skip_serializing)]
    pub anon_key: Option<String>,
    /// Supabase project JWT secret; when set, access tokens are verified locally
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    /// Domain appended to managed clinic usernames that are not email addresses
    pub managed_email_domain: String,
    /// Lifetime of tokens issued by the in-memory provider
    pub jwt_expiry_hours: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    pub checkout_link: String,
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    /// Maximum age of a signed webhook; 0 disables the check
    pub signature_tolerance_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandingConfig {
    pub app_title: String,
    pub app_logo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env::var("RECEPTIONIST_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_BACKEND") {
            self.database.backend = match v.as_str() {
                "memory" => StoreBackend::Memory,
                "postgres" => StoreBackend::Postgres,
                _ => self.database.backend,
            };
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Identity overrides
        if let Ok(v) = env::var("IDENTITY_BACKEND") {
            self.identity.backend = match v.as_str() {
                "memory" => IdentityBackend::Memory,
                "supabase" => IdentityBackend::Supabase,
                _ => self.identity.backend,
            };
        }
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.identity.supabase_url = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_ROLE") {
            self.identity.service_role_key = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_ANON_KEY") {
            self.identity.anon_key = non_empty(v);
        }
        if let Ok(v) = env::var("SUPABASE_JWT_SECRET") {
            self.identity.jwt_secret = non_empty(v);
        }
        if let Ok(v) = env::var("MANAGED_EMAIL_DOMAIN") {
            if !v.trim().is_empty() {
                self.identity.managed_email_domain = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("IDENTITY_JWT_EXPIRY_HOURS") {
            self.identity.jwt_expiry_hours = v.parse().unwrap_or(self.identity.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("IDENTITY_REQUEST_TIMEOUT_SECS") {
            self.identity.request_timeout_secs = v.parse().unwrap_or(self.identity.request_timeout_secs);
        }

        // Billing overrides
        if let Ok(v) = env::var("PADDLE_BILLING_LINK") {
            if !v.trim().is_empty() {
                self.billing.checkout_link = v;
            }
        }
        if let Ok(v) = env::var("PADDLE_WEBHOOK_SECRET") {
            self.billing.webhook_secret = non_empty(v);
        }
        if let Ok(v) = env::var("PADDLE_SIGNATURE_TOLERANCE_SECS") {
            self.billing.signature_tolerance_secs = v.parse().unwrap_or(self.billing.signature_tolerance_secs);
        }

        // Branding overrides
        if let Ok(v) = env::var("APP_TITLE") {
            if !v.trim().is_empty() {
                self.branding.app_title = v;
            }
        }
        if let Ok(v) = env::var("APP_LOGO") {
            if !v.trim().is_empty() {
                self.branding.app_logo = v;
            }
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            identity: IdentityConfig {
                backend: IdentityBackend::Supabase,
                supabase_url: None,
                service_role_key: None,
                anon_key: None,
                jwt_secret: None,
                managed_email_domain: "managed.local".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                request_timeout_secs: 30,
            },
            billing: BillingConfig::defaults(0),
            branding: BrandingConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            identity: IdentityConfig {
                backend: IdentityBackend::Supabase,
                supabase_url: None,
                service_role_key: None,
                anon_key: None,
                jwt_secret: None,
                managed_email_domain: "managed.local".to_string(),
                jwt_expiry_hours: 24,
                request_timeout_secs: 10,
            },
            billing: BillingConfig::defaults(300),
            branding: BrandingConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            identity: IdentityConfig {
                backend: IdentityBackend::Supabase,
                supabase_url: None,
                service_role_key: None,
                anon_key: None,
                jwt_secret: None,
                managed_email_domain: "managed.local".to_string(),
                jwt_expiry_hours: 4,
                request_timeout_secs: 10,
            },
            billing: BillingConfig::defaults(300),
            branding: BrandingConfig::default(),
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    /// Configuration for tests and local demos: in-memory store and identity provider
    pub fn in_memory() -> Self {
        let mut config = Self::development();
        config.database.backend = StoreBackend::Memory;
        config.identity.backend = IdentityBackend::Memory;
        config.identity.jwt_secret = Some("in-memory-development-secret".to_string());
        config
    }
}

impl BillingConfig {
    fn defaults(signature_tolerance_secs: u64) -> Self {
        Self {
            checkout_link: "https://example.paddle.com/checkout/usage-only".to_string(),
            webhook_secret: None,
            signature_tolerance_secs,
        }
    }
}

impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            app_title: "Hybrid AI Receptionist".to_string(),
            app_logo: "https://placehold.co/128x128/0F172A/F8FAFC?text=AI".to_string(),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
