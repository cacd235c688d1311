use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::{conflict_on_unique, ServiceError, ServiceResult};
use super::tenant_event;
use super::user_service::insert_user;
use super::validation::{slugify, validate_display_name};
use crate::auth::Role;
use crate::database::models::{Tenant, User};
use crate::filter::{FilterOrder, Page, Pagination, SortSpec};
use crate::observer::ObserverPipeline;
use crate::state::AppState;
use crate::types::ActivityAction;

pub const SORT_COLUMNS: &[&str] = &["name", "slug", "created_at", "updated_at"];

const MAX_TENANT_NAME: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct NewTenantAdmin {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenant {
    pub name: String,
    pub admin: Option<NewTenantAdmin>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTenant {
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantWithAdmin {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub admin: Option<User>,
}

pub struct TenantService {
    pool: PgPool,
    pipeline: Arc<ObserverPipeline>,
}

impl TenantService {
    pub fn new(pool: PgPool, pipeline: Arc<ObserverPipeline>) -> Self {
        Self { pool, pipeline }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.pool.clone(), Arc::clone(&state.pipeline))
    }

    /// Create a tenant and, optionally, its first tenant admin in one transaction
    pub async fn create_tenant(&self, actor: &User, input: CreateTenant) -> ServiceResult<TenantWithAdmin> {
        let created = self.insert_tenant(input).await?;
        let TenantWithAdmin { tenant, admin } = &created;

        self.pipeline.dispatch(
            tenant_event(ActivityAction::TenantCreated, actor, tenant, tenant.id, &tenant.name)
                .with_details(json!({ "slug": tenant.slug, "admin_email": admin.as_ref().map(|a| a.email.clone()) })),
        );
        Ok(created)
    }

    /// Operator CLI path: same rules, no actor and no notifications
    pub async fn create_tenant_unchecked(&self, input: CreateTenant) -> ServiceResult<TenantWithAdmin> {
        self.insert_tenant(input).await
    }

    async fn insert_tenant(&self, input: CreateTenant) -> ServiceResult<TenantWithAdmin> {
        let name = validate_display_name(&input.name, MAX_TENANT_NAME)?;
        let slug = slugify(&name);
        if slug.is_empty() {
            return Err(ServiceError::field("name", "must contain at least one letter or digit"));
        }

        let mut tx = self.pool.begin().await?;

        let tenant = sqlx::query_as::<_, Tenant>("INSERT INTO tenants (name, slug) VALUES ($1, $2) RETURNING *")
            .bind(&name)
            .bind(&slug)
            .fetch_one(&mut *tx)
            .await
            .map_err(conflict_on_unique(format!("A tenant with slug '{}' already exists", slug)))?;

        let admin = match &input.admin {
            Some(admin) => {
                Some(insert_user(&mut tx, Some(tenant.id), &admin.email, &admin.name, Role::TenantAdmin, true).await?)
            }
            None => None,
        };

        tx.commit().await?;

        tracing::info!("Tenant {} '{}' created", tenant.id, tenant.slug);
        Ok(TenantWithAdmin { tenant, admin })
    }

    /// Active, untrashed tenants by default; everything with `include_inactive`
    pub async fn list_tenants(
        &self,
        include_inactive: bool,
        pagination: Pagination,
        sort: &[SortSpec],
    ) -> ServiceResult<Page<Tenant>> {
        let filter = if include_inactive {
            "TRUE"
        } else {
            "is_active AND trashed_at IS NULL"
        };

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM tenants WHERE {}", filter))
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT * FROM tenants WHERE {} {} LIMIT $1 OFFSET $2",
            filter,
            FilterOrder::generate(sort)
        );
        let items = sqlx::query_as::<_, Tenant>(&sql)
            .bind(pagination.limit())
            .bind(pagination.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Any tenant, trashed or not
    pub async fn get_tenant(&self, id: Uuid) -> ServiceResult<Tenant> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Tenant"))
    }

    /// Rename or (de)activate. The slug stays fixed once issued.
    pub async fn update_tenant(&self, actor: &User, id: Uuid, patch: UpdateTenant) -> ServiceResult<Tenant> {
        let current = self.get_tenant(id).await?;
        let name = match &patch.name {
            Some(raw) => validate_display_name(raw, MAX_TENANT_NAME)?,
            None => current.name.clone(),
        };
        let is_active = patch.is_active.unwrap_or(current.is_active);

        if name == current.name && is_active == current.is_active {
            return Ok(current);
        }

        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET name = $1, is_active = $2, updated_at = now() WHERE id = $3 RETURNING *",
        )
        .bind(&name)
        .bind(is_active)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        let action = if current.is_active && !tenant.is_active {
            ActivityAction::TenantDeactivated
        } else {
            ActivityAction::TenantUpdated
        };
        self.pipeline.dispatch(tenant_event(action, actor, &tenant, tenant.id, &tenant.name).with_details(json!({
            "previous_name": current.name,
            "is_active": tenant.is_active,
        })));

        Ok(tenant)
    }

    /// Soft-delete a tenant; its users are locked out until it is restored
    pub async fn trash_tenant(&self, actor: &User, id: Uuid) -> ServiceResult<Tenant> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET trashed_at = now(), updated_at = now() \
             WHERE id = $1 AND trashed_at IS NULL RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Tenant"))?;

        tracing::info!("Tenant {} '{}' moved to trash", tenant.id, tenant.slug);
        self.pipeline.dispatch(
            tenant_event(ActivityAction::TenantDeactivated, actor, &tenant, tenant.id, &tenant.name)
                .with_details(json!({ "trashed": true })),
        );
        Ok(tenant)
    }

    pub async fn restore_tenant(&self, actor: &User, id: Uuid) -> ServiceResult<Tenant> {
        let tenant = sqlx::query_as::<_, Tenant>(
            "UPDATE tenants SET trashed_at = NULL, updated_at = now() \
             WHERE id = $1 AND trashed_at IS NOT NULL RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Trashed tenant"))?;

        self.pipeline
            .dispatch(tenant_event(ActivityAction::TenantRestored, actor, &tenant, tenant.id, &tenant.name));
        Ok(tenant)
    }
}
