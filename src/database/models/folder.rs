use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub trashed_at: Option<DateTime<Utc>>,
}

/// One step of a breadcrumb trail, root first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FolderCrumb {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub depth: i32,
}
