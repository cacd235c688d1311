pub mod commands;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config;
use crate::database::DatabaseManager;
use crate::observer::ObserverPipeline;

#[derive(Parser)]
#[command(name = "docvault")]
#[command(about = "DocVault operator CLI - migrations, tenants, users and development tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply database migrations")]
    Migrate,

    #[command(about = "Tenant management")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "User management, including master admins")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Mint a bearer token for an existing user (development)")]
    Token(commands::token::TokenArgs),
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

/// Operator commands write directly; no activity is dispatched for them
pub(crate) fn silent_pipeline() -> Arc<ObserverPipeline> {
    Arc::new(ObserverPipeline::new(Duration::from_millis(
        config::config().notifications.observer_timeout_ms,
    )))
}

pub(crate) async fn connect() -> anyhow::Result<PgPool> {
    let pool = DatabaseManager::main_pool().await?;
    DatabaseManager::health_check(&pool).await?;
    Ok(pool)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let result = match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format.clone()).await,
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, output_format.clone()).await,
        Commands::User { cmd } => commands::user::handle(cmd, output_format.clone()).await,
        Commands::Token(args) => commands::token::handle(args, output_format.clone()).await,
    };

    DatabaseManager::close_all().await;

    if let (Err(e), OutputFormat::Json) = (&result, &output_format) {
        utils::output_error(&output_format, &e.to_string())?;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn parses_user_create_with_global_json_flag() {
        let cli = Cli::try_parse_from([
            "docvault",
            "user",
            "create",
            "--email",
            "root@docvault.test",
            "--name",
            "Root",
            "--role",
            "master_admin",
            "--json",
        ])
        .unwrap();

        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::User { cmd: commands::user::UserCommands::Create { role, tenant, .. } } => {
                assert_eq!(role, Role::MasterAdmin);
                assert_eq!(tenant, None);
            }
            _ => panic!("expected user create"),
        }
    }

    #[test]
    fn token_requires_a_user() {
        assert!(Cli::try_parse_from(["docvault", "token"]).is_err());
        assert!(Cli::try_parse_from(["docvault", "token", "--user", "not-a-uuid"]).is_err());
    }
}
