use clap::Subcommand;
use uuid::Uuid;

use crate::auth::Role;
use crate::cli::utils::output_success;
use crate::cli::{connect, silent_pipeline, OutputFormat};
use crate::services::UserService;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user; master admins are created without a tenant")]
    Create {
        #[arg(long)]
        email: String,

        #[arg(long)]
        name: String,

        #[arg(long, help = "master_admin, tenant_admin or staff")]
        role: Role,

        #[arg(long, help = "Tenant id, required for tenant roles")]
        tenant: Option<Uuid>,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = UserService::new(connect().await?, silent_pipeline());

    match cmd {
        UserCommands::Create { email, name, role, tenant } => {
            let user = service.create_user_unchecked(tenant, &email, &name, role).await?;
            output_success(
                &output_format,
                &format!("User {} ({}) created with id {}", user.email, user.role, user.id),
                Some(serde_json::to_value(&user)?),
            )
        }
    }
}
