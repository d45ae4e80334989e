use clap::Args;
use serde_json::json;

use crate::access;
use crate::cli::utils::output_value;
use crate::cli::OutputFormat;
use crate::types::Role;

#[derive(Args)]
pub struct GuardArgs {
    #[arg(help = "Dashboard path, e.g. /clinic/billing")]
    pub path: String,

    #[arg(long, help = "Role to evaluate (agency_admin, managed_clinic, independent_clinic); omit for anonymous")]
    pub role: Option<Role>,
}

pub fn handle(args: GuardArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let decision = access::guard(&args.path, args.role);

    match output_format {
        OutputFormat::Json => output_value(
            output_format,
            &json!({
                "path": args.path,
                "role": args.role,
                "allowed": decision.allowed,
                "redirect": decision.redirect,
            }),
        ),
        OutputFormat::Text => {
            let who = args.role.map_or("anonymous", |r| r.as_str());
            match decision.redirect {
                None => println!("✓ {} may open {}", who, args.path),
                Some(to) => println!("✗ {} is redirected from {} to {}", who, args.path, to),
            }
            Ok(())
        }
    }
}
