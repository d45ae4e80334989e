use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::app::build_state;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{AppConfig, StoreBackend};

#[derive(Subcommand)]
pub enum AgencyCommands {
    #[command(about = "Register an agency with its admin login")]
    Create {
        #[arg(long, help = "Agency name")]
        name: String,
        #[arg(long, help = "Admin email")]
        email: String,
        #[arg(long, env = "RECEPTIONIST_ADMIN_PASSWORD", hide_env_values = true, help = "Admin password")]
        password: String,
    },
}

pub async fn handle(cmd: AgencyCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AgencyCommands::Create { name, email, password } => {
            let config = AppConfig::from_env();
            if config.database.backend == StoreBackend::Memory {
                tracing::warn!("DATABASE_BACKEND=memory: the agency is discarded when this command exits");
            }

            let state = build_state(config).await.context("Failed to connect backends")?;
            let registered = state.provisioning().register_agency(&name, &email, &password).await?;

            output_success(
                output_format,
                &format!("Agency '{}' created ({})", registered.agency.name, registered.agency.id),
                Some(json!({
                    "agency": registered.agency,
                    "profile": registered.profile,
                })),
            )
        }
    }
}
