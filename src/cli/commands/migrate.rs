use crate::cli::utils::output_success;
use crate::cli::{connect, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    DatabaseManager::migrate(&pool).await?;
    output_success(&output_format, "Migrations applied", None)
}
