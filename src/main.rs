use anyhow::Context;
use tracing_subscriber::EnvFilter;

use receptionist_api::app;
use receptionist_api::config::{self, StoreBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config().clone();
    tracing::info!("Starting Receptionist API in {:?} mode", config.environment);

    if receptionist_api::is_production!() && config.database.backend == StoreBackend::Memory {
        anyhow::bail!("DATABASE_BACKEND=memory is not allowed in production");
    }

    let port = config.server.port;
    let state = app::build_state(config).await.context("failed to initialize backends")?;
    let router = app::router(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Receptionist API listening on http://{}", bind_addr);

    axum::serve(listener, router).await.context("server error")?;
    Ok(())
}
