use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::mail::templates::{activity_body, activity_title};
use crate::observer::context::{ActivityRecorded, NotificationsCreated, ObserverContext};
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing};

/// Notification ring: one in-app notification per recipient
pub struct InAppNotificationObserver {
    pool: PgPool,
}

impl InAppNotificationObserver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Observer for InAppNotificationObserver {
    fn name(&self) -> &'static str {
        "InAppNotificationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Notification
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        if ctx.recipients().is_empty() {
            ctx.set_metadata(NotificationsCreated(0));
            return Ok(());
        }

        // The audit ring may have failed; notifications are still useful
        // without the activity link.
        let activity_id = ctx.get_metadata::<ActivityRecorded>().map(|a| a.activity_id);
        let event = &ctx.event;
        let title = activity_title(event);
        let body = activity_body(event);

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO notifications (recipient_id, tenant_id, activity_id, action, title, body) ",
        );
        builder.push_values(ctx.recipients(), |mut row, recipient| {
            row.push_bind(recipient.id)
                .push_bind(event.tenant_id)
                .push_bind(activity_id)
                .push_bind(event.action.as_str())
                .push_bind(&title)
                .push_bind(&body);
        });

        let inserted = builder.build().execute(&self.pool).await?.rows_affected() as usize;

        tracing::debug!("Created {} notification(s) for {}", inserted, event.action);
        ctx.set_metadata(NotificationsCreated(inserted));
        Ok(())
    }
}
