use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::models::User;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "Id of the user the token is issued for")]
    pub user: Uuid,
}

/// Tokens normally come from the identity provider; this one is signed with
/// the local SECURITY_JWT_SECRET and mirrors the user's current role.
pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(args.user)
        .fetch_optional(&pool)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User {} not found", args.user))?;

    if !user.is_active {
        anyhow::bail!("User {} is deactivated", user.email);
    }

    let claims = Claims::new(user.id, user.tenant_id, user.role);
    let token = generate_jwt(&claims)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            &format!("Token issued for {}", user.email),
            Some(json!({ "token": token, "expires_at": claims.exp, "user_id": user.id })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
