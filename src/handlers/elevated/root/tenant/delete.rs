// handlers/elevated/root/tenant/delete.rs - DELETE /api/root/tenants/:id

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::TenantService;
use crate::state::AppState;

/// Soft delete. Users of a trashed tenant fail user validation (403) until
/// the tenant is restored; no content is removed.
pub async fn tenant_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Tenant> {
    let tenant = TenantService::from_state(&state).trash_tenant(&current.user, id).await?;
    Ok(ApiResponse::success(tenant))
}
