use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::observer::context::{ActivityRecorded, ObserverContext};
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing};

/// Audit ring: persists every event to `activity_log`
pub struct ActivityLogObserver {
    pool: PgPool,
}

impl ActivityLogObserver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Observer for ActivityLogObserver {
    fn name(&self) -> &'static str {
        "ActivityLogObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Audit
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let event = &ctx.event;

        let activity_id: Uuid = sqlx::query_scalar(
            "INSERT INTO activity_log \
             (id, tenant_id, actor_id, action, entity_type, entity_id, entity_name, details, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(event.id)
        .bind(event.tenant_id)
        .bind(event.actor.id)
        .bind(event.action.as_str())
        .bind(event.action.entity().as_str())
        .bind(event.entity_id)
        .bind(&event.entity_name)
        .bind(&event.details)
        .bind(event.occurred_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Recorded activity {} ({})", activity_id, event.action);
        ctx.set_metadata(ActivityRecorded { activity_id });
        Ok(())
    }
}
