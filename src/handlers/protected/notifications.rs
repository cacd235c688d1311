// handlers/protected/notifications.rs - the caller's own notifications

use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Action;
use crate::database::models::Notification;
use crate::filter::{Page, PageParams, Pagination};
use crate::middleware::{ApiQuery, ApiResponse, ApiResult, CurrentUser};
use crate::services::notification_service::{MarkedRead, UnreadCount};
use crate::services::NotificationService;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationListQuery {
    #[serde(default)]
    pub unread: bool,
}

/// GET /api/notifications?unread=true - newest first
pub async fn notification_list(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiQuery(paging): ApiQuery<PageParams>,
    ApiQuery(query): ApiQuery<NotificationListQuery>,
) -> ApiResult<Page<Notification>> {
    current.require(Action::ReadNotifications)?;
    let pagination = Pagination::resolve(&paging, &state.config.api)?;

    let page = NotificationService::from_state(&state)
        .list(&current.user, query.unread, pagination)
        .await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/notifications/unread-count
pub async fn notification_unread_count(State(state): State<AppState>, current: CurrentUser) -> ApiResult<UnreadCount> {
    current.require(Action::ReadNotifications)?;
    let count = NotificationService::from_state(&state).unread_count(&current.user).await?;
    Ok(ApiResponse::success(count))
}

/// POST /api/notifications/:id/read
pub async fn notification_read(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Notification> {
    current.require(Action::ReadNotifications)?;
    let notification = NotificationService::from_state(&state).mark_read(&current.user, id).await?;
    Ok(ApiResponse::success(notification))
}

/// POST /api/notifications/read-all
pub async fn notification_read_all(State(state): State<AppState>, current: CurrentUser) -> ApiResult<MarkedRead> {
    current.require(Action::ReadNotifications)?;
    let marked = NotificationService::from_state(&state).mark_all_read(&current.user).await?;
    Ok(ApiResponse::success(marked))
}
