use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;

use crate::auth::Role;
use crate::observer::context::{ObserverContext, Recipient, Recipients};
use crate::observer::error::ObserverError;
use crate::observer::event::ActivityEvent;
use crate::observer::traits::{Observer, ObserverRing};
use crate::types::EntityKind;

/// Enrichment ring: works out who hears about an event
pub struct RecipientObserver {
    pool: PgPool,
}

impl RecipientObserver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn candidates(&self, event: &ActivityEvent) -> Result<Vec<Recipient>, ObserverError> {
        let rows = sqlx::query_as::<_, Recipient>(
            "SELECT id, tenant_id, email, name, role, is_active, email_notifications \
             FROM users \
             WHERE is_active \
               AND (role = 'master_admin' OR (role = 'tenant_admin' AND tenant_id = $1)) \
             ORDER BY created_at, id",
        )
        .bind(event.tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Filter candidate users down to the recipients of `event`.
///
/// Master admins hear about everything. Tenant admins hear about their own
/// tenant's content and users, but tenant lifecycle events go to master
/// admins only. The actor is never notified of their own action.
pub fn select_recipients(event: &ActivityEvent, candidates: Vec<Recipient>) -> Vec<Recipient> {
    let tenant_event = event.action.entity() == EntityKind::Tenant;
    let mut seen = HashSet::new();

    candidates
        .into_iter()
        .filter(|c| c.is_active && c.id != event.actor.id)
        .filter(|c| match c.role {
            Role::MasterAdmin => true,
            Role::TenantAdmin => !tenant_event && event.tenant_id.is_some() && c.tenant_id == event.tenant_id,
            Role::Staff => false,
        })
        .filter(|c| seen.insert(c.id))
        .collect()
}

#[async_trait]
impl Observer for RecipientObserver {
    fn name(&self) -> &'static str {
        "RecipientObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let candidates = self.candidates(&ctx.event).await?;
        let recipients = select_recipients(&ctx.event, candidates);

        tracing::debug!("{} recipient(s) for {}", recipients.len(), ctx.event.action);
        ctx.set_metadata(Recipients(recipients));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_event, sample_recipient};
    use crate::types::ActivityAction;
    use uuid::Uuid;

    fn ids(recipients: &[Recipient]) -> Vec<Uuid> {
        recipients.iter().map(|r| r.id).collect()
    }

    #[test]
    fn content_events_reach_own_tenant_admins_and_master_admins() {
        let event = sample_event(ActivityAction::DocumentCreated, "q3.pdf");
        let tenant = event.tenant_id;

        let own_admin = sample_recipient(Role::TenantAdmin, tenant);
        let other_admin = sample_recipient(Role::TenantAdmin, Some(Uuid::new_v4()));
        let master = sample_recipient(Role::MasterAdmin, None);
        let staff = sample_recipient(Role::Staff, tenant);

        let selected = select_recipients(
            &event,
            vec![own_admin.clone(), other_admin, master.clone(), staff],
        );
        assert_eq!(ids(&selected), vec![own_admin.id, master.id]);
    }

    #[test]
    fn excludes_actor_inactive_users_and_duplicates() {
        let event = sample_event(ActivityAction::FolderTrashed, "Invoices");

        let mut actor = sample_recipient(Role::TenantAdmin, event.tenant_id);
        actor.id = event.actor.id;
        let mut inactive = sample_recipient(Role::MasterAdmin, None);
        inactive.is_active = false;
        let master = sample_recipient(Role::MasterAdmin, None);

        let selected = select_recipients(&event, vec![actor, inactive, master.clone(), master.clone()]);
        assert_eq!(ids(&selected), vec![master.id]);
    }

    #[test]
    fn tenant_lifecycle_events_only_reach_master_admins() {
        let event = sample_event(ActivityAction::TenantDeactivated, "Acme Corp");
        let admin = sample_recipient(Role::TenantAdmin, event.tenant_id);
        let master = sample_recipient(Role::MasterAdmin, None);

        let selected = select_recipients(&event, vec![admin, master.clone()]);
        assert_eq!(ids(&selected), vec![master.id]);
    }

    #[test]
    fn events_without_tenant_skip_tenant_admins() {
        let mut event = sample_event(ActivityAction::UserCreated, "Fox Mulder");
        event.tenant_id = None;
        let admin = sample_recipient(Role::TenantAdmin, Some(Uuid::new_v4()));

        assert!(select_recipients(&event, vec![admin]).is_empty());
    }
}
