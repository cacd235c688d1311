// handlers/elevated/root/tenant/update.rs - PATCH /api/root/tenants/:id

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::services::{TenantService, UpdateTenant};
use crate::state::AppState;

/// Rename (slug unchanged) or toggle `is_active`
pub async fn tenant_update(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<UpdateTenant>,
) -> ApiResult<Tenant> {
    let tenant = TenantService::from_state(&state)
        .update_tenant(&current.user, id, patch)
        .await?;
    Ok(ApiResponse::success(tenant))
}
