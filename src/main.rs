use anyhow::Context;
use tracing_subscriber::EnvFilter;

use docvault_api::config;
use docvault_api::database::DatabaseManager;
use docvault_api::observer::implementations::standard_pipeline;
use docvault_api::routes::app;
use docvault_api::state::AppState;
use docvault_api::{mail, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    config.validate().context("invalid configuration")?;
    tracing::info!("Starting DocVault API in {:?} mode", config.environment);

    let pool = DatabaseManager::main_pool().await.context("failed to create database pool")?;
    if config.database.run_migrations {
        // A database that is down at boot is reported by /health instead
        if let Err(e) = DatabaseManager::migrate(&pool).await {
            tracing::error!("Migrations not applied: {}", e);
        }
    }

    let store = storage::from_config(&config.storage);
    let mailer = mail::from_config(&config.mail).context("failed to build mailer")?;
    let pipeline = standard_pipeline(pool.clone(), mailer, &config.notifications, &config.mail);
    tracing::info!(
        "Object store: {}, observers registered: {}",
        store.name(),
        pipeline.observer_count()
    );

    let state = AppState::new(pool, store, pipeline, config);

    let bind_addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("DocVault API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close_all().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
