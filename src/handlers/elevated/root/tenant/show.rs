// handlers/elevated/root/tenant/show.rs - GET /api/root/tenants/:id

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::TenantService;
use crate::state::AppState;

/// Trashed tenants are visible here so they can be inspected before restore
pub async fn tenant_show(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Tenant> {
    let tenant = TenantService::from_state(&state).get_tenant(id).await?;
    Ok(ApiResponse::success(tenant))
}
