use std::time::Duration;

use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{Authenticator, Claims, JwtAuthenticator};
use crate::cli::utils::{output_success, print_fields};
use crate::cli::OutputFormat;
use crate::config;
use crate::database::models::DEFAULT_ROLE;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint an access token with the configured secret")]
    Issue {
        #[arg(long, help = "User id to place in the subject claim")]
        user_id: i64,
        #[arg(long, default_value = DEFAULT_ROLE, help = "Role claim")]
        role: String,
        #[arg(long, help = "Lifetime in hours (defaults to AUTH_TOKEN_EXP_HOURS)")]
        ttl_hours: Option<u64>,
    },

    #[command(about = "Validate a token and print its claims")]
    Verify {
        #[arg(help = "Encoded token")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let auth = &config::config().auth;
    let authenticator = JwtAuthenticator::new(&auth.token_secret, &auth.issuer, &auth.issuer)
        .context("AUTH_TOKEN_SECRET is not usable")?;

    match cmd {
        TokenCommands::Issue { user_id, role, ttl_hours } => {
            anyhow::ensure!(user_id > 0, "user id must be a positive integer");

            let ttl = ttl_hours
                .map(|hours| Duration::from_secs(hours.saturating_mul(3600)))
                .unwrap_or(auth.token_exp);
            let claims = Claims::new(user_id, role, &auth.issuer, ttl);
            let token = authenticator.generate_token(&claims)?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_at": claims.exp })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        TokenCommands::Verify { token } => {
            let claims = authenticator.validate_token(&token)?;
            let user_id = claims.user_id()?;
            let details = json!({
                "user_id": user_id,
                "role": claims.role,
                "issuer": claims.iss,
                "expires_at": claims.exp,
            });

            output_success(&output_format, "Token is valid", Some(details.clone()))?;
            if matches!(output_format, OutputFormat::Text) {
                print_fields(&details);
            }
            Ok(())
        }
    }
}
