pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "receptionist")]
#[command(about = "Receptionist CLI - operator tooling for the receptionist dashboard API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "RECEPTIONIST_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the API server"
    )]
    pub url: String,

    #[arg(long, global = true, env = "RECEPTIONIST_TOKEN", hide_env_values = true, help = "Bearer token for protected endpoints")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Evaluate the dashboard route guard offline")]
    Guard(commands::guard::GuardArgs),

    #[command(about = "Remote server status")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Provision logins for agency clinics")]
    Provision {
        #[command(subcommand)]
        cmd: commands::provision::ProvisionCommands,
    },

    #[command(about = "Subscription mirror operations")]
    Subscription {
        #[command(subcommand)]
        cmd: commands::subscription::SubscriptionCommands,
    },

    #[command(about = "Agency management against the configured backends")]
    Agency {
        #[command(subcommand)]
        cmd: commands::agency::AgencyCommands,
    },

    #[command(about = "Database maintenance")]
    Db {
        #[command(subcommand)]
        cmd: commands::db::DbCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Guard(args) => commands::guard::handle(args, output_format),
        Commands::Server { cmd } => {
            let client = ApiClient::new(&cli.url, None)?;
            commands::server::handle(cmd, &client, output_format).await
        }
        Commands::Provision { cmd } => {
            let client = ApiClient::new(&cli.url, cli.token)?;
            commands::provision::handle(cmd, &client, output_format).await
        }
        Commands::Subscription { cmd } => {
            let client = ApiClient::new(&cli.url, cli.token)?;
            commands::subscription::handle(cmd, &client, output_format).await
        }
        Commands::Agency { cmd } => commands::agency::handle(cmd, output_format).await,
        Commands::Db { cmd } => commands::db::handle(cmd, output_format).await,
    }
}
