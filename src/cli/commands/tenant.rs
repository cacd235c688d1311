use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::{connect, silent_pipeline, OutputFormat};
use crate::filter::{Pagination, SortDirection, SortSpec};
use crate::services::{CreateTenant, NewTenantAdmin, TenantService};

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List tenants")]
    List {
        #[arg(long, help = "Include deactivated and trashed tenants")]
        all: bool,
    },

    #[command(about = "Create a tenant, optionally with its first tenant admin")]
    Create {
        #[arg(help = "Tenant display name; the slug is derived from it")]
        name: String,

        #[arg(long, requires = "admin_name", help = "Email of the first tenant admin")]
        admin_email: Option<String>,

        #[arg(long, requires = "admin_email", help = "Name of the first tenant admin")]
        admin_name: Option<String>,
    },
}

const LIST_LIMIT: u32 = 1000;

pub async fn handle(cmd: TenantCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = TenantService::new(connect().await?, silent_pipeline());

    match cmd {
        TenantCommands::List { all } => {
            let sort = [SortSpec { column: "name", sort: SortDirection::Asc }];
            let page = service
                .list_tenants(all, Pagination { page: 1, limit: LIST_LIMIT }, &sort)
                .await?;

            if page.items.is_empty() {
                return output_empty_collection(&output_format, "tenants", "No tenants");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "success": true, "data": page }))?);
                }
                OutputFormat::Text => {
                    let rows: Vec<Vec<String>> = page
                        .items
                        .iter()
                        .map(|t| {
                            let status = match (t.is_active, t.trashed_at.is_some()) {
                                (_, true) => "trashed",
                                (false, false) => "inactive",
                                (true, false) => "active",
                            };
                            vec![
                                t.id.to_string(),
                                t.slug.clone(),
                                t.name.clone(),
                                status.to_string(),
                                t.created_at.format("%Y-%m-%d %H:%M").to_string(),
                            ]
                        })
                        .collect();
                    println!("{}", render_table(&["ID", "SLUG", "NAME", "STATUS", "CREATED"], &rows));
                }
            }
            Ok(())
        }
        TenantCommands::Create { name, admin_email, admin_name } => {
            let admin = match (admin_email, admin_name) {
                (Some(email), Some(name)) => Some(NewTenantAdmin { email, name }),
                _ => None,
            };

            let created = service.create_tenant_unchecked(CreateTenant { name, admin }).await?;

            let mut message = format!("Tenant '{}' created with id {}", created.tenant.slug, created.tenant.id);
            if let Some(admin) = &created.admin {
                message.push_str(&format!("; tenant admin {} has id {}", admin.email, admin.id));
            }
            output_success(&output_format, &message, Some(serde_json::to_value(&created)?))
        }
    }
}
