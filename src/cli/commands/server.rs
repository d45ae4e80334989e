use clap::Subcommand;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_error, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Show server information from API root endpoint")]
    Info,

    #[command(about = "Check server health status from API /health endpoint")]
    Health,
}

pub async fn handle(cmd: ServerCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Info => {
            let info = client.get("/").await?.into_result()?;
            output_value(output_format, &info)
        }
        ServerCommands::Health => {
            let reply = client.get("/health").await?;
            output_value(output_format, &reply.body)?;

            if !reply.status.is_success() {
                output_error(output_format, "Server is unhealthy", Some("SERVICE_UNAVAILABLE"))?;
                anyhow::bail!("health check returned {}", reply.status);
            }
            Ok(())
        }
    }
}
