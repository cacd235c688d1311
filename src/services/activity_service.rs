use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::error::ServiceResult;
use crate::database::models::{ActivityRecord, Tenant};
use crate::filter::{Page, Pagination};
use crate::state::AppState;

/// Optional narrowing of the activity feed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub actor_id: Option<Uuid>,
    pub action: Option<String>,
}

pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.pool.clone())
    }

    /// Tenant activity, newest first
    pub async fn list(
        &self,
        tenant: &Tenant,
        filter: &ActivityFilter,
        pagination: Pagination,
    ) -> ServiceResult<Page<ActivityRecord>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM activity_log WHERE ");
        push_filter(&mut count, tenant.id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM activity_log WHERE ");
        push_filter(&mut select, tenant.id, filter);
        select.push(" ORDER BY created_at DESC, id DESC LIMIT ").push_bind(pagination.limit());
        select.push(" OFFSET ").push_bind(pagination.offset());
        let items = select.build_query_as::<ActivityRecord>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, total, pagination))
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &ActivityFilter) {
    qb.push("tenant_id = ").push_bind(tenant_id);
    if let Some(entity_type) = &filter.entity_type {
        qb.push(" AND entity_type = ").push_bind(entity_type.clone());
    }
    if let Some(entity_id) = filter.entity_id {
        qb.push(" AND entity_id = ").push_bind(entity_id);
    }
    if let Some(actor_id) = filter.actor_id {
        qb.push(" AND actor_id = ").push_bind(actor_id);
    }
    if let Some(action) = &filter.action {
        qb.push(" AND action = ").push_bind(action.clone());
    }
}
