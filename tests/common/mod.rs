#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use receptionist_api::app::{self, AppState};
use receptionist_api::auth::MemoryIdentityProvider;
use receptionist_api::config::AppConfig;
use receptionist_api::database::models::{Clinic, NewClinic};
use receptionist_api::database::MemoryTenantStore;

pub const PASSWORD: &str = "correct-horse-battery";

/// In-process router over the in-memory store and identity provider
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryTenantStore>,
    router: Router,
}

/// Agency registered through the operator flow and signed in over HTTP
pub struct AgencyLogin {
    pub agency_id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::in_memory())
    }

    pub fn with_webhook_secret(secret: &str) -> Self {
        let mut config = AppConfig::in_memory();
        config.billing.webhook_secret = Some(secret.to_string());
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryTenantStore::new());
        let identity = Arc::new(MemoryIdentityProvider::new(
            config.identity.jwt_secret.clone().unwrap_or_default(),
            config.identity.jwt_expiry_hours,
        ));
        let state = AppState::new(store.clone(), identity, config);
        let router = app::router(state.clone());
        Self { state, store, router }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let request = authorized(Request::builder().method(Method::GET).uri(path), token)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send_json(Method::POST, path, token, body).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send_json(Method::PATCH, path, token, body).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let request = authorized(Request::builder().method(Method::DELETE).uri(path), token)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// POST a raw body, for webhook deliveries and malformed JSON
    pub async fn post_raw(&self, path: &str, headers: &[(&str, &str)], body: impl Into<Bytes>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(Body::from(body.into())).unwrap()).await
    }

    async fn send_json(&self, method: Method, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let request = authorized(Request::builder().method(method).uri(path), token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn login(&self, credentials: Value) -> String {
        let (status, body) = self.post("/auth/login", None, credentials).await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["accessToken"].as_str().unwrap().to_string()
    }

    pub async fn register_agency(&self, name: &str) -> AgencyLogin {
        let email = format!("admin-{}@agency.test", Uuid::new_v4().simple());
        let registered = self
            .state
            .provisioning()
            .register_agency(name, &email, PASSWORD)
            .await
            .unwrap();
        let token = self.login(json!({ "email": email, "password": PASSWORD })).await;
        AgencyLogin { agency_id: registered.agency.id, token }
    }

    /// Clinic row under an agency with no login yet
    pub async fn insert_agency_clinic(&self, agency_id: Uuid, name: &str) -> Clinic {
        use receptionist_api::database::TenantStore;
        self.store.insert_clinic(&NewClinic::managed(name, agency_id)).await.unwrap()
    }

    /// Self-serve signup followed by a password login
    pub async fn signup_clinic(&self, name: &str, email: &str) -> (Uuid, String) {
        let (status, body) = self
            .post(
                "/api/signup/independent-clinic",
                None,
                json!({ "name": name, "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
        let clinic_id = body["clinic"]["id"].as_str().unwrap().parse().unwrap();
        let token = self.login(json!({ "email": email, "password": PASSWORD })).await;
        (clinic_id, token)
    }
}

fn authorized(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        None => builder,
    }
}

/// The server binary running on the in-memory backends, stopped on drop
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_receptionist-api"));
        cmd.env("RECEPTIONIST_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("DATABASE_BACKEND", "memory")
            .env("IDENTITY_BACKEND", "memory")
            .env("SUPABASE_JWT_SECRET", "smoke-test-secret")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Start a server for one test; it is killed when the returned value drops
pub async fn spawn_server() -> Result<TestServer> {
    let server = TestServer::spawn()?;
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
