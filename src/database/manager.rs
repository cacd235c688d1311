use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config;

/// Errors from DatabaseManager and the SQL issued by services
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// True when Postgres rejected the statement on a unique index (SQLSTATE 23505).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Sqlx(err) => err
                .as_database_error()
                .and_then(|db| db.code())
                .map(|code| code == "23505")
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Name of the constraint a database error reports, if any
    pub fn violated_constraint(&self) -> Option<&str> {
        match self {
            DatabaseError::Sqlx(err) => err.as_database_error().and_then(|db| db.constraint()),
            _ => None,
        }
    }
}

/// Centralized connection pool manager keyed by database name
pub struct DatabaseManager {
    pools: Arc<RwLock<HashMap<String, PgPool>>>,
}

impl DatabaseManager {
    fn instance() -> &'static DatabaseManager {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<DatabaseManager> = OnceLock::new();
        INSTANCE.get_or_init(|| DatabaseManager {
            pools: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Name of the system database when DATABASE_URL does not carry one.
    const DEFAULT_DB_NAME: &'static str = "docvault";

    /// Get the main system database pool.
    ///
    /// The pool connects lazily so the server can start (and report a degraded
    /// health check) before Postgres is reachable.
    pub async fn main_pool() -> Result<PgPool, DatabaseError> {
        let name = Self::database_name()?;
        Self::instance().get_pool(&name).await
    }

    /// Get existing pool or create a new one lazily
    async fn get_pool(&self, database_name: &str) -> Result<PgPool, DatabaseError> {
        if !Self::is_valid_db_name(database_name) {
            return Err(DatabaseError::InvalidDatabaseName(database_name.to_string()));
        }

        // Fast path: try read lock
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(database_name) {
                return Ok(pool.clone());
            }
        }

        let connection_string = Self::build_connection_string(database_name)?;
        let settings = &config::config().database;

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connection_timeout))
            .connect_lazy(&connection_string)?;

        let mut pools = self.pools.write().await;
        let pool = pools
            .entry(database_name.to_string())
            .or_insert(pool)
            .clone();

        info!("Created database pool for: {}", database_name);
        Ok(pool)
    }

    fn base_url() -> Result<String, DatabaseError> {
        config::config()
            .database
            .url
            .clone()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))
    }

    /// Database name taken from the DATABASE_URL path, defaulting to "docvault"
    fn database_name() -> Result<String, DatabaseError> {
        let url = url::Url::parse(&Self::base_url()?).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        let name = url.path().trim_start_matches('/');
        if name.is_empty() {
            Ok(Self::DEFAULT_DB_NAME.to_string())
        } else {
            Ok(name.to_string())
        }
    }

    fn build_connection_string(database_name: &str) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(&Self::base_url()?).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        // Replace the path to the database name (ensure leading slash)
        url.set_path(&format!("/{}", database_name));
        Ok(url.into_string())
    }

    /// Pings the given pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Apply embedded migrations from ./migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(|e| DatabaseError::MigrationError(e.to_string()))?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Close and remove all pools (e.g., on shutdown)
    pub async fn close_all() {
        let manager = Self::instance();
        let mut pools = manager.pools.write().await;
        for (name, pool) in pools.drain() {
            pool.close().await;
            info!("Closed database pool: {}", name);
        }
    }

    /// Database names are interpolated into connection strings only, but keep
    /// them to [a-zA-Z0-9_] anyway.
    fn is_valid_db_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 63
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}
