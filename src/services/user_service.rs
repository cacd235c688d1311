use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::error::{conflict_on_unique, ServiceError, ServiceResult};
use super::tenant_event;
use super::validation::{normalize_email, validate_display_name};
use crate::auth::Role;
use crate::database::models::{Tenant, User};
use crate::filter::{FilterOrder, Page, Pagination, SortSpec};
use crate::observer::ObserverPipeline;
use crate::state::AppState;
use crate::types::ActivityAction;

pub const SORT_COLUMNS: &[&str] = &["name", "email", "role", "created_at"];

const MAX_PERSON_NAME: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub email_notifications: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub email_notifications: Option<bool>,
}

/// Fields a user may change on their own profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMe {
    pub name: Option<String>,
    pub email_notifications: Option<bool>,
}

fn default_true() -> bool {
    true
}

pub struct UserService {
    pool: PgPool,
    pipeline: Arc<ObserverPipeline>,
}

impl UserService {
    pub fn new(pool: PgPool, pipeline: Arc<ObserverPipeline>) -> Self {
        Self { pool, pipeline }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.pool.clone(), Arc::clone(&state.pipeline))
    }

    pub async fn list_users(&self, tenant: &Tenant, pagination: Pagination, sort: &[SortSpec]) -> ServiceResult<Page<User>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE tenant_id = $1")
            .bind(tenant.id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT * FROM users WHERE tenant_id = $1 {} LIMIT $2 OFFSET $3",
            FilterOrder::generate(sort)
        );
        let items = sqlx::query_as::<_, User>(&sql)
            .bind(tenant.id)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, total, pagination))
    }

    pub async fn get_user(&self, tenant: &Tenant, id: Uuid) -> ServiceResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    /// Add a tenant admin or staff member to `tenant`
    pub async fn create_user(&self, tenant: &Tenant, actor: &User, input: CreateUser) -> ServiceResult<User> {
        if input.role == Role::MasterAdmin {
            return Err(match actor.role {
                Role::MasterAdmin => ServiceError::invalid("Master admins do not belong to a tenant; use the docvault CLI"),
                _ => ServiceError::Forbidden("Only master admins can create master admins".to_string()),
            });
        }

        let mut conn = self.pool.acquire().await?;
        let user = insert_user(
            &mut conn,
            Some(tenant.id),
            &input.email,
            &input.name,
            input.role,
            input.email_notifications,
        )
        .await?;

        tracing::info!("User {} ({}) created in tenant {}", user.id, user.role, tenant.slug);
        self.pipeline.dispatch(
            tenant_event(ActivityAction::UserCreated, actor, tenant, user.id, &user.name)
                .with_details(json!({ "email": user.email, "role": user.role })),
        );
        Ok(user)
    }

    pub async fn update_user(&self, tenant: &Tenant, actor: &User, id: Uuid, patch: UpdateUser) -> ServiceResult<User> {
        if patch.role == Some(Role::MasterAdmin) {
            return Err(ServiceError::field("role", "tenant users cannot become master admins"));
        }

        let mut tx = self.pool.begin().await?;

        // Tenant row first, then the user: every update takes the locks in the
        // same order, so concurrent demotions queue instead of deadlocking
        lock_tenant(&mut tx, tenant.id).await?;

        let current = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND tenant_id = $2 FOR UPDATE")
            .bind(id)
            .bind(tenant.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        let name = match &patch.name {
            Some(raw) => validate_display_name(raw, MAX_PERSON_NAME)?,
            None => current.name.clone(),
        };
        let role = patch.role.unwrap_or(current.role);
        let is_active = patch.is_active.unwrap_or(current.is_active);
        let email_notifications = patch.email_notifications.unwrap_or(current.email_notifications);

        let deactivating = current.is_active && !is_active;
        let demoting = current.role == Role::TenantAdmin && role != Role::TenantAdmin;

        if current.id == actor.id && (deactivating || demoting) {
            return Err(ServiceError::Forbidden("You cannot deactivate or demote yourself".to_string()));
        }

        if current.role == Role::TenantAdmin && current.is_active && (deactivating || demoting) {
            let others: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM users \
                 WHERE tenant_id = $1 AND role = 'tenant_admin' AND is_active AND id <> $2",
            )
            .bind(tenant.id)
            .bind(current.id)
            .fetch_one(&mut *tx)
            .await?;

            if others == 0 {
                return Err(ServiceError::conflict("A tenant must keep at least one active tenant admin"));
            }
        }

        let updated = sqlx::query_as::<_, User>(
            "UPDATE users SET name = $1, role = $2, is_active = $3, email_notifications = $4, updated_at = now() \
             WHERE id = $5 RETURNING *",
        )
        .bind(&name)
        .bind(role.as_str())
        .bind(is_active)
        .bind(email_notifications)
        .bind(current.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let action = if deactivating {
            ActivityAction::UserDeactivated
        } else {
            ActivityAction::UserUpdated
        };
        self.pipeline.dispatch(tenant_event(action, actor, tenant, updated.id, &updated.name).with_details(json!({
            "role": updated.role,
            "previous_role": current.role,
            "is_active": updated.is_active,
        })));

        Ok(updated)
    }

    /// Profile edits do not notify anyone
    pub async fn update_me(&self, me: &User, patch: UpdateMe) -> ServiceResult<User> {
        let name = match &patch.name {
            Some(raw) => validate_display_name(raw, MAX_PERSON_NAME)?,
            None => me.name.clone(),
        };
        let email_notifications = patch.email_notifications.unwrap_or(me.email_notifications);

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET name = $1, email_notifications = $2, updated_at = now() WHERE id = $3 RETURNING *",
        )
        .bind(&name)
        .bind(email_notifications)
        .bind(me.id)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Operator path used by the CLI; the only way to create master admins
    pub async fn create_user_unchecked(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
        name: &str,
        role: Role,
    ) -> ServiceResult<User> {
        if role.is_tenant_bound() != tenant_id.is_some() {
            return Err(ServiceError::invalid("Master admins have no tenant; every other role needs one"));
        }
        let mut conn = self.pool.acquire().await?;
        insert_user(&mut conn, tenant_id, email, name, role, true).await
    }
}

/// Serialize user changes within a tenant. `NO KEY UPDATE` leaves inserts
/// referencing the tenant unblocked.
async fn lock_tenant(conn: &mut PgConnection, tenant_id: Uuid) -> ServiceResult<()> {
    sqlx::query("SELECT 1 FROM tenants WHERE id = $1 FOR NO KEY UPDATE")
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tenant"))?;
    Ok(())
}

pub(crate) async fn insert_user(
    conn: &mut PgConnection,
    tenant_id: Option<Uuid>,
    email: &str,
    name: &str,
    role: Role,
    email_notifications: bool,
) -> ServiceResult<User> {
    let email = normalize_email(email)?;
    let name = validate_display_name(name, MAX_PERSON_NAME)?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (tenant_id, email, name, role, email_notifications) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(tenant_id)
    .bind(&email)
    .bind(&name)
    .bind(role.as_str())
    .bind(email_notifications)
    .fetch_one(conn)
    .await
    .map_err(conflict_on_unique(format!("A user with email '{}' already exists", email)))?;

    Ok(user)
}
