// handlers/elevated/root/tenant/list.rs - GET /api/root/tenants

use axum::extract::State;
use serde::Deserialize;

use crate::database::models::Tenant;
use crate::filter::{Page, PageParams};
use crate::handlers::list_window;
use crate::middleware::{ApiQuery, ApiResponse, ApiResult};
use crate::services::tenant_service::SORT_COLUMNS;
use crate::services::TenantService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TenantListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Active, untrashed tenants unless `include_inactive=true`
pub async fn tenant_list(
    State(state): State<AppState>,
    ApiQuery(paging): ApiQuery<PageParams>,
    ApiQuery(query): ApiQuery<TenantListQuery>,
) -> ApiResult<Page<Tenant>> {
    let (pagination, sort) = list_window(&state, &paging, SORT_COLUMNS)?;
    let page = TenantService::from_state(&state)
        .list_tenants(query.include_inactive, pagination, &sort)
        .await?;
    Ok(ApiResponse::success(page))
}
