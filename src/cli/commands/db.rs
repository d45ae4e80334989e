use anyhow::Context;
use clap::Subcommand;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StoreBackend};
use crate::database::DatabaseManager;

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,

    #[command(about = "Check database connectivity")]
    Ping,
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    if config.database.backend != StoreBackend::Postgres {
        anyhow::bail!("DATABASE_BACKEND is not postgres; nothing to do");
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate(&pool).await?;
            output_success(output_format, "Migrations applied", None)
        }
        DbCommands::Ping => {
            DatabaseManager::health_check(&pool).await?;
            output_success(output_format, "Database reachable", None)
        }
    }
}
