// handlers/protected/folders.rs - /api/folders

use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Action;
use crate::database::models::Folder;
use crate::filter::{Page, PageParams, TrashFilter};
use crate::handlers::list_window;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, CurrentUser, TenantScope};
use crate::services::folder_service::SORT_COLUMNS;
use crate::services::{CreateFolder, FolderContents, FolderDetail, FolderService, SubtreeChange, UpdateFolder};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FolderListQuery {
    pub parent_id: Option<Uuid>,
    pub trashed: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrashQuery {
    #[serde(default)]
    pub recursive: bool,
}

/// GET /api/folders?parent_id=&trashed=
pub async fn folder_list(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    ApiQuery(paging): ApiQuery<PageParams>,
    ApiQuery(query): ApiQuery<FolderListQuery>,
) -> ApiResult<Page<Folder>> {
    current.require(Action::ReadContent)?;
    let (pagination, sort) = list_window(&state, &paging, SORT_COLUMNS)?;

    let page = FolderService::from_state(&state)
        .list_folders(&tenant, query.parent_id, TrashFilter::from_flag(query.trashed), pagination, &sort)
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/folders
pub async fn folder_create(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    ApiJson(input): ApiJson<CreateFolder>,
) -> ApiResult<Folder> {
    current.require(Action::WriteContent)?;
    let folder = FolderService::from_state(&state)
        .create_folder(&tenant, &current.user, input)
        .await?;
    Ok(ApiResponse::created(folder))
}

/// GET /api/folders/:id
pub async fn folder_show(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
) -> ApiResult<FolderDetail> {
    current.require(Action::ReadContent)?;
    let detail = FolderService::from_state(&state).get_folder(&tenant, id).await?;
    Ok(ApiResponse::success(detail))
}

/// PATCH /api/folders/:id - rename and/or move
pub async fn folder_update(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<UpdateFolder>,
) -> ApiResult<Folder> {
    current.require(Action::WriteContent)?;
    let folder = FolderService::from_state(&state)
        .update_folder(&tenant, &current.user, id, patch)
        .await?;
    Ok(ApiResponse::success(folder))
}

/// DELETE /api/folders/:id?recursive=true
pub async fn folder_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
    ApiQuery(query): ApiQuery<TrashQuery>,
) -> ApiResult<SubtreeChange> {
    current.require(Action::WriteContent)?;
    let change = FolderService::from_state(&state)
        .trash_folder(&tenant, &current.user, id, query.recursive)
        .await?;
    Ok(ApiResponse::success(change))
}

/// GET /api/folders/:id/contents
pub async fn folder_contents(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
    ApiQuery(paging): ApiQuery<PageParams>,
) -> ApiResult<FolderContents> {
    current.require(Action::ReadContent)?;
    let (pagination, sort) = list_window(&state, &paging, crate::services::document_service::SORT_COLUMNS)?;

    let contents = FolderService::from_state(&state)
        .folder_contents(&tenant, id, pagination, &sort)
        .await?;
    Ok(ApiResponse::success(contents))
}

/// POST /api/folders/:id/restore
pub async fn folder_restore(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
) -> ApiResult<SubtreeChange> {
    current.require(Action::WriteContent)?;
    let change = FolderService::from_state(&state)
        .restore_folder(&tenant, &current.user, id)
        .await?;
    Ok(ApiResponse::success(change))
}
