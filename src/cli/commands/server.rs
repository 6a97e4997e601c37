use std::time::Duration;

use clap::Subcommand;
use serde_json::Value;

use crate::cli::utils::{output_error, output_success, print_fields};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from API /api/v1/health endpoint")]
    Health {
        #[arg(long, help = "Base URL of the server (defaults to EXTERNAL_URL)")]
        url: Option<String>,
    },
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health { url } => {
            let base = url.unwrap_or_else(|| config::config().server.api_url.clone());
            let endpoint = health_url(&base);

            let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;
            let response = match client.get(&endpoint).send().await {
                Ok(response) => response,
                Err(e) => {
                    output_error(&output_format, &format!("{} is unreachable: {}", endpoint, e), Some("UNREACHABLE"))?;
                    anyhow::bail!("health check failed");
                }
            };

            let status = response.status();
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let data = body.get("data").cloned().unwrap_or(Value::Null);

            if status.is_success() {
                output_success(&output_format, &format!("{} is healthy", base), Some(data.clone()))?;
                if matches!(output_format, OutputFormat::Text) {
                    print_fields(&data);
                }
                Ok(())
            } else {
                output_error(&output_format, &format!("{} responded with {}", endpoint, status), Some("UNHEALTHY"))?;
                anyhow::bail!("health check failed")
            }
        }
    }
}

/// Accepts `host:port` or a full URL, with or without a trailing slash.
fn health_url(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/api/v1/health", base)
    } else {
        format!("http://{}/api/v1/health", base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_url() {
        assert_eq!(health_url("localhost:8000"), "http://localhost:8000/api/v1/health");
        assert_eq!(health_url("https://api.example.com/"), "https://api.example.com/api/v1/health");
    }
}
