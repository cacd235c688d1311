// handlers/protected/activity.rs - GET /api/activity

use axum::extract::State;

use crate::auth::Action;
use crate::database::models::ActivityRecord;
use crate::filter::{Page, PageParams, Pagination};
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, CurrentUser, TenantScope};
use crate::services::{ActivityFilter, ActivityService};
use crate::state::AppState;

/// Tenant activity feed, newest first. Accepts `entity_type`, `entity_id`,
/// `actor_id` and `action` filters.
pub async fn activity_list(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    ApiQuery(paging): ApiQuery<PageParams>,
    ApiQuery(filter): ApiQuery<ActivityFilter>,
) -> ApiResult<Page<ActivityRecord>> {
    current.require(Action::ViewActivity)?;
    let pagination = Pagination::resolve(&paging, &state.config.api)?;

    let page = ActivityService::from_state(&state).list(&tenant, &filter, pagination).await?;
    Ok(ApiResponse::success(page))
}
