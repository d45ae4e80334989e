use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_success, output_value};
use crate::cli::OutputFormat;
use crate::types::OwnerType;

#[derive(Subcommand)]
pub enum SubscriptionCommands {
    #[command(about = "Mark the owner's subscription canceled")]
    Cancel {
        #[arg(long, help = "Owner type (agency or clinic)")]
        owner_type: OwnerType,
        #[arg(long, help = "Agency or clinic ID")]
        owner_id: Uuid,
    },

    #[command(about = "Show the mirrored subscription of an owner")]
    Show {
        #[arg(long, help = "Owner type (agency or clinic)")]
        owner_type: OwnerType,
        #[arg(long, help = "Agency or clinic ID")]
        owner_id: Uuid,
    },
}

pub async fn handle(cmd: SubscriptionCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    client.require_token()?;

    match cmd {
        SubscriptionCommands::Cancel { owner_type, owner_id } => {
            let body = json!({ "ownerType": owner_type, "ownerId": owner_id });
            let reply = client.post("/api/subscriptions/cancel", &body).await?.into_result()?;
            output_success(
                output_format,
                &format!("Subscription of {} {} canceled", owner_type, owner_id),
                Some(reply),
            )
        }
        SubscriptionCommands::Show { owner_type, owner_id } => {
            let subscription = client
                .get(&format!("/api/subscriptions/{}/{}", owner_type, owner_id))
                .await?
                .into_result()?;
            output_value(output_format, &subscription)
        }
    }
}
