//! Flix CLI - operator tooling
//!
//! Usage:
//!   flix hash-password <plaintext>
//!   flix issue-token <username>
//!   flix verify-token <token>
//!   flix config

use anyhow::Context;
use clap::{Parser, Subcommand};
use flix_api::auth::{hash_password, issue_token, verify_token, JwtConfig, PasswordConfig};
use flix_core::AppConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flix")]
#[command(about = "Operator tools for the flix movie API")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, global = true, env = "FLIX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password with the configured Argon2id parameters
    HashPassword {
        /// Plaintext password
        plaintext: String,
    },
    /// Issue a signed token for a username
    IssueToken {
        /// Username to embed as the subject
        username: String,
    },
    /// Verify a token and print its claims
    VerifyToken {
        /// Token without the `Bearer ` prefix
        token: String,
    },
    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    if config.auth.uses_dev_secret() {
        tracing::warn!("JWT_SECRET is not set; tokens use the development signing secret");
    }

    match cli.command {
        Commands::HashPassword { plaintext } => {
            let password_config = PasswordConfig::from(&config.auth);
            let digest = tokio::task::spawn_blocking(move || {
                hash_password(&plaintext, &password_config)
            })
            .await??;
            println!("{digest}");
        }
        Commands::IssueToken { username } => {
            let issued = issue_token(&JwtConfig::from(&config.auth), &username)?;
            println!("{}", serde_json::to_string_pretty(&issued)?);
        }
        Commands::VerifyToken { token } => {
            let claims = verify_token(&JwtConfig::from(&config.auth), &token)
                .context("token rejected")?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config.redacted())?);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["flix", "issue-token", "alice01"]);
        assert!(matches!(cli.command, Commands::IssueToken { username } if username == "alice01"));

        let cli = Cli::parse_from(["flix", "--config", "flix.toml", "config"]);
        assert_eq!(cli.config, Some(PathBuf::from("flix.toml")));
        assert!(matches!(cli.command, Commands::Config));
    }
}
