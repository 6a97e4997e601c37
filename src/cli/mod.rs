pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "fintrack")]
#[command(about = "FinTrack CLI - operator tooling for the finance tracker API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Access token management")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Remote server checks")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_issue() {
        let cli = Cli::try_parse_from(["fintrack", "--json", "token", "issue", "--user-id", "7", "--role", "admin"]).unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Token {
                cmd: commands::token::TokenCommands::Issue { user_id, role, .. },
            } => {
                assert_eq!(user_id, 7);
                assert_eq!(role, "admin");
            }
            _ => panic!("expected token issue"),
        }
    }

    #[test]
    fn server_health_url_is_optional() {
        let cli = Cli::try_parse_from(["fintrack", "server", "health"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Server {
                cmd: commands::server::ServerCommands::Health { url: None }
            }
        ));
    }
}
