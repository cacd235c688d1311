use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::document_service::{query_documents, DocumentFilter};
use super::error::{conflict_on_unique, ServiceError, ServiceResult};
use super::hierarchy::{breadcrumbs, check_depth, would_create_cycle};
use super::validation::validate_name;
use super::{double_option, tenant_event};
use crate::config::HierarchyConfig;
use crate::database::models::{Document, Folder, FolderCrumb, Tenant, User};
use crate::filter::{FilterOrder, Page, Pagination, SortSpec, TrashFilter};
use crate::observer::ObserverPipeline;
use crate::state::AppState;
use crate::types::ActivityAction;

pub const SORT_COLUMNS: &[&str] = &["name", "created_at", "updated_at"];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolder {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

/// PATCH body; a single request may rename and move
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFolder {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderDetail {
    #[serde(flatten)]
    pub folder: Folder,
    pub breadcrumbs: Vec<FolderCrumb>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderContents {
    pub folder: Folder,
    pub breadcrumbs: Vec<FolderCrumb>,
    pub folders: Vec<Folder>,
    pub documents: Page<Document>,
}

/// Result of trashing or restoring a folder subtree
#[derive(Debug, Clone, Serialize)]
pub struct SubtreeChange {
    pub folder: Folder,
    pub folders: u64,
    pub documents: u64,
}

pub struct FolderService {
    pool: PgPool,
    pipeline: Arc<ObserverPipeline>,
    hierarchy: HierarchyConfig,
}

impl FolderService {
    pub fn new(pool: PgPool, pipeline: Arc<ObserverPipeline>, hierarchy: HierarchyConfig) -> Self {
        Self { pool, pipeline, hierarchy }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.pool.clone(), Arc::clone(&state.pipeline), state.config.hierarchy.clone())
    }

    pub async fn create_folder(&self, tenant: &Tenant, actor: &User, input: CreateFolder) -> ServiceResult<Folder> {
        let name = validate_name(&input.name, self.hierarchy.max_name_length)?;
        let mut conn = self.pool.acquire().await?;

        let parent_depth = match input.parent_id {
            Some(parent_id) => {
                live_folder(&mut conn, tenant.id, parent_id, false).await?;
                ancestry(&mut conn, tenant.id, parent_id, self.hierarchy.max_folder_depth).await?.len() as u32
            }
            None => 0,
        };
        check_depth(parent_depth, 0, self.hierarchy.max_folder_depth)?;

        let folder = sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (tenant_id, parent_id, name, created_by) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(tenant.id)
        .bind(input.parent_id)
        .bind(&name)
        .bind(actor.id)
        .fetch_one(&mut *conn)
        .await
        .map_err(conflict_on_unique(format!("A folder named '{}' already exists here", name)))?;

        tracing::info!("Folder {} '{}' created in tenant {}", folder.id, folder.name, tenant.slug);
        self.pipeline.dispatch(
            tenant_event(ActivityAction::FolderCreated, actor, tenant, folder.id, &folder.name)
                .with_details(json!({ "parent_id": folder.parent_id })),
        );
        Ok(folder)
    }

    pub async fn get_folder(&self, tenant: &Tenant, id: Uuid) -> ServiceResult<FolderDetail> {
        let mut conn = self.pool.acquire().await?;
        let folder = live_folder(&mut conn, tenant.id, id, false).await?;
        let chain = ancestry(&mut conn, tenant.id, id, self.hierarchy.max_folder_depth).await?;
        Ok(FolderDetail { folder, breadcrumbs: breadcrumbs(chain) })
    }

    /// Direct children of `parent_id` (tenant root when `None`). The trash
    /// view lists every trashed folder unless a parent is given.
    pub async fn list_folders(
        &self,
        tenant: &Tenant,
        parent_id: Option<Uuid>,
        trash: TrashFilter,
        pagination: Pagination,
        sort: &[SortSpec],
    ) -> ServiceResult<Page<Folder>> {
        if let (Some(parent), TrashFilter::Live) = (parent_id, trash) {
            let mut conn = self.pool.acquire().await?;
            live_folder(&mut conn, tenant.id, parent, false).await?;
        }

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM folders WHERE ");
        push_list_filter(&mut count, tenant.id, parent_id, trash);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM folders WHERE ");
        push_list_filter(&mut select, tenant.id, parent_id, trash);
        select.push(" ").push(FilterOrder::generate(sort));
        select.push(" LIMIT ").push_bind(pagination.limit());
        select.push(" OFFSET ").push_bind(pagination.offset());
        let items = select.build_query_as::<Folder>().fetch_all(&self.pool).await?;

        Ok(Page::new(items, total, pagination))
    }

    /// Subfolders (all, by name) and a page of documents of one live folder
    pub async fn folder_contents(
        &self,
        tenant: &Tenant,
        id: Uuid,
        pagination: Pagination,
        sort: &[SortSpec],
    ) -> ServiceResult<FolderContents> {
        let FolderDetail { folder, breadcrumbs } = self.get_folder(tenant, id).await?;

        let folders = sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE tenant_id = $1 AND parent_id = $2 AND trashed_at IS NULL \
             ORDER BY lower(name), id",
        )
        .bind(tenant.id)
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let filter = DocumentFilter { folder_id: Some(id), ..Default::default() };
        let documents = query_documents(&self.pool, tenant.id, &filter, pagination, sort).await?;

        Ok(FolderContents { folder, breadcrumbs, folders, documents })
    }

    /// Rename and/or move a folder
    pub async fn update_folder(
        &self,
        tenant: &Tenant,
        actor: &User,
        id: Uuid,
        patch: UpdateFolder,
    ) -> ServiceResult<Folder> {
        let mut tx = self.pool.begin().await?;
        let folder = live_folder(&mut tx, tenant.id, id, true).await?;

        let name = match &patch.name {
            Some(raw) => validate_name(raw, self.hierarchy.max_name_length)?,
            None => folder.name.clone(),
        };
        let parent_id = patch.parent_id.unwrap_or(folder.parent_id);
        let moved = parent_id != folder.parent_id;

        if moved {
            let parent_depth = match parent_id {
                Some(target) => {
                    if target == folder.id {
                        return Err(ServiceError::invalid("A folder cannot be moved into itself"));
                    }
                    live_folder(&mut tx, tenant.id, target, false).await?;
                    let chain = ancestry(&mut tx, tenant.id, target, self.hierarchy.max_folder_depth).await?;
                    let chain_ids: Vec<Uuid> = chain.iter().map(|c| c.id).collect();
                    if would_create_cycle(folder.id, &chain_ids) {
                        return Err(ServiceError::invalid("A folder cannot be moved into one of its descendants"));
                    }
                    chain.len() as u32
                }
                None => 0,
            };
            let height = subtree_height(&mut tx, tenant.id, folder.id).await?;
            check_depth(parent_depth, height, self.hierarchy.max_folder_depth)?;
        }

        if !moved && name == folder.name {
            return Ok(folder);
        }

        let updated = sqlx::query_as::<_, Folder>(
            "UPDATE folders SET name = $1, parent_id = $2, updated_at = now() \
             WHERE id = $3 AND tenant_id = $4 RETURNING *",
        )
        .bind(&name)
        .bind(parent_id)
        .bind(folder.id)
        .bind(tenant.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(format!("A folder named '{}' already exists there", name)))?;

        tx.commit().await?;

        let event = if moved {
            tenant_event(ActivityAction::FolderMoved, actor, tenant, updated.id, &updated.name).with_details(json!({
                "from_parent_id": folder.parent_id,
                "to_parent_id": updated.parent_id,
                "previous_name": (folder.name != updated.name).then(|| folder.name.clone()),
            }))
        } else {
            tenant_event(ActivityAction::FolderRenamed, actor, tenant, updated.id, &updated.name)
                .with_details(json!({ "previous_name": folder.name }))
        };
        self.pipeline.dispatch(event);

        Ok(updated)
    }

    /// Move a folder and, with `recursive`, everything live below it to the
    /// trash under one shared timestamp.
    pub async fn trash_folder(
        &self,
        tenant: &Tenant,
        actor: &User,
        id: Uuid,
        recursive: bool,
    ) -> ServiceResult<SubtreeChange> {
        let mut tx = self.pool.begin().await?;
        let folder = live_folder(&mut tx, tenant.id, id, true).await?;

        let has_children: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM folders WHERE tenant_id = $1 AND parent_id = $2 AND trashed_at IS NULL) \
                 OR EXISTS (SELECT 1 FROM documents WHERE tenant_id = $1 AND folder_id = $2 AND trashed_at IS NULL)",
        )
        .bind(tenant.id)
        .bind(folder.id)
        .fetch_one(&mut *tx)
        .await?;

        if has_children && !recursive {
            return Err(ServiceError::conflict(
                "Folder is not empty; pass recursive=true to trash it with its contents",
            ));
        }

        let stamp = Utc::now();
        let ids = subtree_ids(&mut tx, tenant.id, folder.id, None).await?;

        let folders = sqlx::query(
            "UPDATE folders SET trashed_at = $1, updated_at = $1 \
             WHERE tenant_id = $2 AND id = ANY($3) AND trashed_at IS NULL",
        )
        .bind(stamp)
        .bind(tenant.id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let documents = sqlx::query(
            "UPDATE documents SET trashed_at = $1, updated_at = $1, updated_by = $4 \
             WHERE tenant_id = $2 AND folder_id = ANY($3) AND trashed_at IS NULL",
        )
        .bind(stamp)
        .bind(tenant.id)
        .bind(&ids)
        .bind(actor.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::info!(
            "Trashed folder {} with {} folder(s) and {} document(s)",
            folder.id,
            folders,
            documents
        );
        self.pipeline.dispatch(
            tenant_event(ActivityAction::FolderTrashed, actor, tenant, folder.id, &folder.name)
                .with_details(json!({ "folders": folders, "documents": documents })),
        );

        let folder = Folder { trashed_at: Some(stamp), updated_at: stamp, ..folder };
        Ok(SubtreeChange { folder, folders, documents })
    }

    /// Restore a trashed folder and everything that was trashed with it
    pub async fn restore_folder(&self, tenant: &Tenant, actor: &User, id: Uuid) -> ServiceResult<SubtreeChange> {
        let mut tx = self.pool.begin().await?;

        let folder = sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders WHERE id = $1 AND tenant_id = $2 AND trashed_at IS NOT NULL FOR UPDATE",
        )
        .bind(id)
        .bind(tenant.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Trashed folder"))?;

        let Some(stamp) = folder.trashed_at else {
            return Err(ServiceError::not_found("Trashed folder"));
        };

        if let Some(parent_id) = folder.parent_id {
            let parent_live: bool = sqlx::query_scalar(
                "SELECT EXISTS (SELECT 1 FROM folders WHERE id = $1 AND tenant_id = $2 AND trashed_at IS NULL)",
            )
            .bind(parent_id)
            .bind(tenant.id)
            .fetch_one(&mut *tx)
            .await?;
            if !parent_live {
                return Err(ServiceError::conflict("Parent folder is in the trash; restore it first"));
            }
        }

        let collides: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM folders \
             WHERE tenant_id = $1 AND parent_id IS NOT DISTINCT FROM $2 \
               AND lower(name) = lower($3) AND trashed_at IS NULL)",
        )
        .bind(tenant.id)
        .bind(folder.parent_id)
        .bind(&folder.name)
        .fetch_one(&mut *tx)
        .await?;
        if collides {
            return Err(ServiceError::conflict(format!(
                "A live folder named '{}' already exists in the original location",
                folder.name
            )));
        }

        let ids = subtree_ids(&mut tx, tenant.id, folder.id, Some(stamp)).await?;

        let folders = sqlx::query(
            "UPDATE folders SET trashed_at = NULL, updated_at = now() \
             WHERE tenant_id = $1 AND id = ANY($2) AND trashed_at = $3",
        )
        .bind(tenant.id)
        .bind(&ids)
        .bind(stamp)
        .execute(&mut *tx)
        .await
        .map_err(conflict_on_unique("A restored folder collides with a live folder"))?
        .rows_affected();

        let documents = sqlx::query(
            "UPDATE documents SET trashed_at = NULL, updated_at = now(), updated_by = $4 \
             WHERE tenant_id = $1 AND folder_id = ANY($2) AND trashed_at = $3",
        )
        .bind(tenant.id)
        .bind(&ids)
        .bind(stamp)
        .bind(actor.id)
        .execute(&mut *tx)
        .await
        .map_err(conflict_on_unique("A restored document collides with a live document"))?
        .rows_affected();

        let folder = live_folder(&mut tx, tenant.id, folder.id, false).await?;
        tx.commit().await?;

        self.pipeline.dispatch(
            tenant_event(ActivityAction::FolderRestored, actor, tenant, folder.id, &folder.name)
                .with_details(json!({ "folders": folders, "documents": documents })),
        );
        Ok(SubtreeChange { folder, folders, documents })
    }
}

fn push_list_filter(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, parent_id: Option<Uuid>, trash: TrashFilter) {
    qb.push("tenant_id = ").push_bind(tenant_id);
    qb.push(" AND ").push(trash.to_sql());
    match (trash, parent_id) {
        (_, Some(parent)) => {
            qb.push(" AND parent_id = ").push_bind(parent);
        }
        (TrashFilter::Live, None) => {
            qb.push(" AND parent_id IS NULL");
        }
        (TrashFilter::Trashed, None) => {}
    }
}

/// Live folder of the tenant, optionally row-locked. Other tenants' folders
/// are reported as missing.
pub(crate) async fn live_folder(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    id: Uuid,
    for_update: bool,
) -> ServiceResult<Folder> {
    let sql = if for_update {
        "SELECT * FROM folders WHERE id = $1 AND tenant_id = $2 AND trashed_at IS NULL FOR UPDATE"
    } else {
        "SELECT * FROM folders WHERE id = $1 AND tenant_id = $2 AND trashed_at IS NULL"
    };

    sqlx::query_as::<_, Folder>(sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Folder"))
}

/// The folder and its ancestors, leaf first (`depth` 1 is the folder itself)
async fn ancestry(conn: &mut PgConnection, tenant_id: Uuid, id: Uuid, max_depth: u32) -> ServiceResult<Vec<FolderCrumb>> {
    let chain = sqlx::query_as::<_, FolderCrumb>(
        "WITH RECURSIVE chain AS ( \
             SELECT id, parent_id, name, 1 AS depth FROM folders WHERE id = $1 AND tenant_id = $2 \
             UNION ALL \
             SELECT f.id, f.parent_id, f.name, c.depth + 1 \
             FROM folders f JOIN chain c ON f.id = c.parent_id \
             WHERE f.tenant_id = $2 AND c.depth <= $3 \
         ) \
         SELECT id, parent_id, name, depth FROM chain ORDER BY depth",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(max_depth as i32)
    .fetch_all(conn)
    .await?;
    Ok(chain)
}

/// Levels below the folder among live descendants (0 for a leaf)
async fn subtree_height(conn: &mut PgConnection, tenant_id: Uuid, id: Uuid) -> ServiceResult<u32> {
    let height: i32 = sqlx::query_scalar(
        "WITH RECURSIVE sub AS ( \
             SELECT id, 0 AS level FROM folders WHERE id = $1 AND tenant_id = $2 \
             UNION ALL \
             SELECT f.id, s.level + 1 FROM folders f JOIN sub s ON f.parent_id = s.id \
             WHERE f.tenant_id = $2 AND f.trashed_at IS NULL \
         ) \
         SELECT COALESCE(MAX(level), 0)::int4 FROM sub",
    )
    .bind(id)
    .bind(tenant_id)
    .fetch_one(conn)
    .await?;
    Ok(height.max(0) as u32)
}

/// Ids of the folder and its descendants. With `trashed_at`, only follows
/// descendants trashed at exactly that instant; otherwise only live ones.
async fn subtree_ids(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    id: Uuid,
    trashed_at: Option<DateTime<Utc>>,
) -> ServiceResult<Vec<Uuid>> {
    let ids = sqlx::query_scalar(
        "WITH RECURSIVE sub AS ( \
             SELECT id FROM folders WHERE id = $1 AND tenant_id = $2 \
             UNION ALL \
             SELECT f.id FROM folders f JOIN sub s ON f.parent_id = s.id \
             WHERE f.tenant_id = $2 AND f.trashed_at IS NOT DISTINCT FROM $3 \
         ) \
         SELECT id FROM sub",
    )
    .bind(id)
    .bind(tenant_id)
    .bind(trashed_at)
    .fetch_all(conn)
    .await?;
    Ok(ids)
}
