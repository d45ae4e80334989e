use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ProvisionCommands {
    #[command(about = "Create a managed login for an existing agency clinic")]
    ManagedClinic {
        #[arg(long, help = "Clinic ID")]
        clinic_id: Uuid,
        #[arg(long, help = "Owning agency ID")]
        agency_id: Uuid,
        #[arg(long, help = "Login username or email")]
        username: String,
        #[arg(long, env = "RECEPTIONIST_MANAGED_PASSWORD", hide_env_values = true, help = "Login password")]
        password: String,
    },

    #[command(about = "Create a clinic under an agency together with its managed login")]
    AgencyClinic {
        #[arg(long, help = "Owning agency ID")]
        agency_id: Uuid,
        #[arg(long, help = "Clinic name")]
        name: String,
        #[arg(long, help = "Login username or email")]
        username: String,
        #[arg(long, env = "RECEPTIONIST_MANAGED_PASSWORD", hide_env_values = true, help = "Login password")]
        password: String,
        #[arg(long, help = "Clinic phone number")]
        phone_number: Option<String>,
        #[arg(long, help = "GoHighLevel location ID")]
        ghl_location_id: Option<String>,
    },
}

pub async fn handle(cmd: ProvisionCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    client.require_token()?;

    let created = match cmd {
        ProvisionCommands::ManagedClinic { clinic_id, agency_id, username, password } => {
            let body = json!({
                "clinicId": clinic_id,
                "agencyId": agency_id,
                "username": username,
                "password": password,
            });
            client.post("/api/provision/managed-clinic", &body).await?.into_result()?
        }
        ProvisionCommands::AgencyClinic { agency_id, name, username, password, phone_number, ghl_location_id } => {
            let body = json!({
                "clinicName": name,
                "username": username,
                "password": password,
                "phoneNumber": phone_number,
                "ghlLocationId": ghl_location_id,
            });
            client
                .post(&format!("/api/agencies/{}/clinics", agency_id), &body)
                .await?
                .into_result()?
        }
    };

    output_value(output_format, &created)
}
