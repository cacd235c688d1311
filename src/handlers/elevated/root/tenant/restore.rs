// handlers/elevated/root/tenant/restore.rs - POST /api/root/tenants/:id/restore

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::services::TenantService;
use crate::state::AppState;

pub async fn tenant_restore(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Tenant> {
    let tenant = TenantService::from_state(&state).restore_tenant(&current.user, id).await?;
    Ok(ApiResponse::success(tenant))
}
