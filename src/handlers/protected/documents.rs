// handlers/protected/documents.rs - /api/documents
//
// Uploads go straight to object storage; these endpoints only register and
// manage the metadata rows that point at stored objects.

use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Action;
use crate::database::models::Document;
use crate::filter::{Page, PageParams, TrashFilter};
use crate::handlers::list_window;
use crate::middleware::{ApiJson, ApiQuery, ApiResponse, ApiResult, CurrentUser, TenantScope};
use crate::services::document_service::{PurgedDocument, SORT_COLUMNS};
use crate::services::{CreateDocument, DocumentFilter, DocumentService, UpdateDocument};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DocumentListQuery {
    pub folder_id: Option<Uuid>,
    pub q: Option<String>,
    pub content_type: Option<String>,
    pub trashed: Option<bool>,
}

impl From<DocumentListQuery> for DocumentFilter {
    fn from(query: DocumentListQuery) -> Self {
        DocumentFilter {
            folder_id: query.folder_id,
            q: query.q.filter(|q| !q.trim().is_empty()),
            content_type: query.content_type.filter(|c| !c.trim().is_empty()),
            trash: TrashFilter::from_flag(query.trashed),
        }
    }
}

/// GET /api/documents?folder_id=&q=&content_type=&trashed=
pub async fn document_list(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    ApiQuery(paging): ApiQuery<PageParams>,
    ApiQuery(query): ApiQuery<DocumentListQuery>,
) -> ApiResult<Page<Document>> {
    current.require(Action::ReadContent)?;
    let (pagination, sort) = list_window(&state, &paging, SORT_COLUMNS)?;

    let filter = DocumentFilter::from(query);
    let page = DocumentService::from_state(&state)
        .list_documents(&tenant, &filter, pagination, &sort)
        .await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/documents - register an object already uploaded under the
/// tenant's storage prefix
pub async fn document_create(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    ApiJson(input): ApiJson<CreateDocument>,
) -> ApiResult<Document> {
    current.require(Action::WriteContent)?;
    let document = DocumentService::from_state(&state)
        .create_document(&tenant, &current.user, input)
        .await?;
    Ok(ApiResponse::created(document))
}

/// GET /api/documents/:id
pub async fn document_show(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
) -> ApiResult<Document> {
    current.require(Action::ReadContent)?;
    let document = DocumentService::from_state(&state).get_document(&tenant, id).await?;
    Ok(ApiResponse::success(document))
}

/// PATCH /api/documents/:id
pub async fn document_update(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
    ApiJson(patch): ApiJson<UpdateDocument>,
) -> ApiResult<Document> {
    current.require(Action::WriteContent)?;
    let document = DocumentService::from_state(&state)
        .update_document(&tenant, &current.user, id, patch)
        .await?;
    Ok(ApiResponse::success(document))
}

/// DELETE /api/documents/:id - move to trash
pub async fn document_delete(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
) -> ApiResult<Document> {
    current.require(Action::WriteContent)?;
    let document = DocumentService::from_state(&state)
        .trash_document(&tenant, &current.user, id)
        .await?;
    Ok(ApiResponse::success(document))
}

/// POST /api/documents/:id/restore
pub async fn document_restore(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
) -> ApiResult<Document> {
    current.require(Action::WriteContent)?;
    let document = DocumentService::from_state(&state)
        .restore_document(&tenant, &current.user, id)
        .await?;
    Ok(ApiResponse::success(document))
}

/// DELETE /api/documents/:id/purge - permanent; the document must be trashed
pub async fn document_purge(
    State(state): State<AppState>,
    current: CurrentUser,
    TenantScope(tenant): TenantScope,
    Path(id): Path<Uuid>,
) -> ApiResult<PurgedDocument> {
    current.require(Action::PurgeContent)?;
    let purged = DocumentService::from_state(&state)
        .purge_document(&tenant, &current.user, id)
        .await?;
    Ok(ApiResponse::success(purged))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_terms_are_ignored() {
        let query = DocumentListQuery {
            q: Some("  ".to_string()),
            content_type: Some("image/".to_string()),
            trashed: Some(true),
            ..Default::default()
        };
        let filter = DocumentFilter::from(query);

        assert_eq!(filter.q, None);
        assert_eq!(filter.content_type.as_deref(), Some("image/"));
        assert_eq!(filter.trash, TrashFilter::Trashed);
        assert_eq!(filter.folder_id, None);
    }
}
