use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::database::models::{Notification, User};
use crate::filter::{Page, Pagination};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// A user's own notifications. Nobody can read or mark another user's.
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.pool.clone())
    }

    /// Newest first
    pub async fn list(&self, user: &User, unread_only: bool, pagination: Pagination) -> ServiceResult<Page<Notification>> {
        let filter = if unread_only { "AND read_at IS NULL" } else { "" };

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 {}", filter))
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;

        let items = sqlx::query_as::<_, Notification>(&format!(
            "SELECT * FROM notifications WHERE recipient_id = $1 {} \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
            filter
        ))
        .bind(user.id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(items, total, pagination))
    }

    pub async fn unread_count(&self, user: &User) -> ServiceResult<UnreadCount> {
        let unread: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND read_at IS NULL")
                .bind(user.id)
                .fetch_one(&self.pool)
                .await?;
        Ok(UnreadCount { unread })
    }

    /// Idempotent: an already-read notification keeps its first `read_at`
    pub async fn mark_read(&self, user: &User, id: Uuid) -> ServiceResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET read_at = COALESCE(read_at, now()) \
             WHERE id = $1 AND recipient_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Notification"))
    }

    pub async fn mark_all_read(&self, user: &User) -> ServiceResult<MarkedRead> {
        let now: DateTime<Utc> = Utc::now();
        let updated = sqlx::query("UPDATE notifications SET read_at = $2 WHERE recipient_id = $1 AND read_at IS NULL")
            .bind(user.id)
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(MarkedRead { updated })
    }
}
