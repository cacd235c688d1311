// handlers/elevated/root/tenant/create.rs - POST /api/root/tenants

use axum::extract::State;

use crate::middleware::{ApiJson, ApiResponse, ApiResult, CurrentUser};
use crate::services::{CreateTenant, TenantService, TenantWithAdmin};
use crate::state::AppState;

/**
 * POST /api/root/tenants - create a tenant and, optionally, its first admin
 *
 * ```json
 * {
 *   "name": "Acme Corp",                                   // slug derived from this
 *   "admin": { "email": "ops@acme.test", "name": "Ops" }   // optional
 * }
 * ```
 *
 * Both rows are written in one transaction; a taken slug or admin email is 409.
 */
pub async fn tenant_create(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(input): ApiJson<CreateTenant>,
) -> ApiResult<TenantWithAdmin> {
    let created = TenantService::from_state(&state).create_tenant(&current.user, input).await?;
    Ok(ApiResponse::created(created))
}
