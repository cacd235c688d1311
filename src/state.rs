use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::observer::ObserverPipeline;
use crate::storage::ObjectStore;

/// Shared handles available to every handler and middleware
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: Arc<dyn ObjectStore>,
    pub pipeline: Arc<ObserverPipeline>,
    pub config: &'static AppConfig,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn ObjectStore>,
        pipeline: ObserverPipeline,
        config: &'static AppConfig,
    ) -> Self {
        Self {
            pool,
            store,
            pipeline: Arc::new(pipeline),
            config,
        }
    }
}
