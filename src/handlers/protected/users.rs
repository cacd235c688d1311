// handlers/protected/users.rs - /api/users (tenant administration)

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::auth::Action;
use crate::database::models::User;
use crate::filter::{Page, PageParams};
use crate::handlers::list_window;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, CurrentUser, TenantScope};
use crate::services::user_service::SORT_COLUMNS;
use crate::services::{CreateUser, UpdateUser, UserService};
use crate::state::AppState;

/// GET /api/users
pub async fn user_list(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<Page<User>> {
    current.require(Action::ManageUsers)?;
    let (pagination, sort) = list_window(&state, &paging, SORT_COLUMNS)?;

    let page = UserService::from_state(&state).list_users(&tenant, pagination, &sort).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/users
pub async fn user_create(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    ApiJson(input): ApiJson<CreateUser>,
) -> ApiResult<User> {
    current.require(Action::ManageUsers)?;
    let user = UserService::from_state(&state)
        .create_user(&tenant, &current.user, input)
        .await?;
    Ok(ApiResponse::created(user))
}

/// GET /api/users/:id
pub async fn user_show(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
) -> ApiResult<User> {
    current.require(Action::ManageUsers)?;
    let user = UserService::from_state(&state).get_user(&tenant, id).await?;
    Ok(ApiResponse::success(user))
}

/// PATCH /api/users/:id
pub async fn user_update(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<UpdateUser>,
) -> ApiResult<User> {
    current.require(Action::ManageUsers)?;
    let user = UserService::from_state(&state)
        .update_user(&tenant, &current.user, id, patch)
        .await?;
    Ok(ApiResponse::success(user))
}
