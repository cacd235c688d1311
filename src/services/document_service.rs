use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::error::{conflict_on_constraint, conflict_on_unique, ServiceError, ServiceResult};
use super::folder_service::live_folder;
use super::validation::{validate_content_type, validate_name};
use super::{double_option, tenant_event};
use crate::config::{HierarchyConfig, StorageConfig};
use crate::database::models::{Document, Tenant, User};
use crate::filter::{FilterOrder, Page, Pagination, SortSpec, TrashFilter};
use crate::observer::ObserverPipeline;
use crate::state::AppState;
use crate::storage::{validate_tenant_key, ObjectStore, StorageError};
use crate::types::ActivityAction;

pub const SORT_COLUMNS: &[&str] = &["name", "created_at", "updated_at", "size_bytes", "content_type"];

const STORAGE_KEY_CONSTRAINT: &str = "documents_storage_key_key";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const MAX_DESCRIPTION_CHARS: usize = 4000;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateDocument {
    pub name: String,
    pub folder_id: Option<Uuid>,
    pub storage_key: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub checksum: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocument {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub content_type: Option<String>,
}

/// Listing filters; `folder_id = None` searches the whole tenant
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub folder_id: Option<Uuid>,
    pub q: Option<String>,
    pub content_type: Option<String>,
    pub trash: TrashFilter,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgedDocument {
    pub id: Uuid,
    pub name: String,
    pub storage_key: String,
    pub object_deleted: bool,
}

pub struct DocumentService {
    pool: PgPool,
    store: Arc<dyn ObjectStore>,
    pipeline: Arc<ObserverPipeline>,
    hierarchy: HierarchyConfig,
    verify_uploads: bool,
}

impl DocumentService {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn ObjectStore>,
        pipeline: Arc<ObserverPipeline>,
        hierarchy: HierarchyConfig,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            pool,
            store,
            pipeline,
            hierarchy,
            verify_uploads: storage.verify_uploads,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.pool.clone(),
            Arc::clone(&state.store),
            Arc::clone(&state.pipeline),
            state.config.hierarchy.clone(),
            &state.config.storage,
        )
    }

    /// Register an uploaded object as a document
    pub async fn create_document(&self, tenant: &Tenant, actor: &User, input: CreateDocument) -> ServiceResult<Document> {
        let name = validate_name(&input.name, self.hierarchy.max_name_length)?;
        let content_type = match input.content_type.as_deref() {
            Some(ct) => validate_content_type(ct)?,
            None => DEFAULT_CONTENT_TYPE.to_string(),
        };
        let description = normalize_description(input.description)?;

        validate_tenant_key(tenant.id, &input.storage_key)
            .map_err(|e| ServiceError::field("storage_key", e.to_string()))?;

        let (size_bytes, checksum) = if self.verify_uploads {
            let meta = self
                .store
                .head(&input.storage_key)
                .await
                .map_err(storage_failure)?
                .ok_or_else(|| {
                    ServiceError::Unprocessable(format!("No uploaded object found at '{}'", input.storage_key))
                })?;
            (meta.size as i64, meta.checksum)
        } else {
            let size = input.size_bytes.unwrap_or(0);
            if size < 0 {
                return Err(ServiceError::field("size_bytes", "must not be negative"));
            }
            (size, input.checksum)
        };

        if let Some(folder_id) = input.folder_id {
            let mut conn = self.pool.acquire().await?;
            live_folder(&mut conn, tenant.id, folder_id, false).await?;
        }

        let document = sqlx::query_as::<_, Document>(
            "INSERT INTO documents \
             (tenant_id, folder_id, name, description, storage_key, content_type, size_bytes, checksum, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) RETURNING *",
        )
        .bind(tenant.id)
        .bind(input.folder_id)
        .bind(&name)
        .bind(&description)
        .bind(&input.storage_key)
        .bind(&content_type)
        .bind(size_bytes)
        .bind(&checksum)
        .bind(actor.id)
        .fetch_one(&self.pool)
        .await
        .map_err(conflict_on_constraint(
            STORAGE_KEY_CONSTRAINT,
            format!("Object '{}' is already registered to another document", input.storage_key),
            format!("A document named '{}' already exists here", name),
        ))?;

        tracing::info!("Document {} '{}' created in tenant {}", document.id, document.name, tenant.slug);
        self.pipeline.dispatch(
            tenant_event(ActivityAction::DocumentCreated, actor, tenant, document.id, &document.name).with_details(json!({
                "folder_id": document.folder_id,
                "content_type": document.content_type,
                "size_bytes": document.size_bytes,
            })),
        );
        Ok(document)
    }

    pub async fn get_document(&self, tenant: &Tenant, id: Uuid) -> ServiceResult<Document> {
        self.find(tenant.id, id, TrashFilter::Live).await
    }

    pub async fn list_documents(
        &self,
        tenant: &Tenant,
        filter: &DocumentFilter,
        pagination: Pagination,
        sort: &[SortSpec],
    ) -> ServiceResult<Page<Document>> {
        if let (Some(folder_id), TrashFilter::Live) = (filter.folder_id, filter.trash) {
            let mut conn = self.pool.acquire().await?;
            live_folder(&mut conn, tenant.id, folder_id, false).await?;
        }
        query_documents(&self.pool, tenant.id, filter, pagination, sort).await
    }

    pub async fn update_document(
        &self,
        tenant: &Tenant,
        actor: &User,
        id: Uuid,
        patch: UpdateDocument,
    ) -> ServiceResult<Document> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE id = $1 AND tenant_id = $2 AND trashed_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .bind(tenant.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Document"))?;

        let name = match &patch.name {
            Some(raw) => validate_name(raw, self.hierarchy.max_name_length)?,
            None => current.name.clone(),
        };
        let content_type = match &patch.content_type {
            Some(ct) => validate_content_type(ct)?,
            None => current.content_type.clone(),
        };
        let description = match patch.description {
            Some(d) => normalize_description(d)?,
            None => current.description.clone(),
        };
        let folder_id = patch.folder_id.unwrap_or(current.folder_id);

        let moved = folder_id != current.folder_id;
        if moved {
            if let Some(target) = folder_id {
                live_folder(&mut tx, tenant.id, target, false).await?;
            }
        }

        let mut changed = Vec::new();
        if name != current.name {
            changed.push("name");
        }
        if content_type != current.content_type {
            changed.push("content_type");
        }
        if description != current.description {
            changed.push("description");
        }
        if !moved && changed.is_empty() {
            return Ok(current);
        }

        let updated = sqlx::query_as::<_, Document>(
            "UPDATE documents SET name = $1, folder_id = $2, description = $3, content_type = $4, \
             updated_by = $5, updated_at = now() \
             WHERE id = $6 AND tenant_id = $7 RETURNING *",
        )
        .bind(&name)
        .bind(folder_id)
        .bind(&description)
        .bind(&content_type)
        .bind(actor.id)
        .bind(id)
        .bind(tenant.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(format!("A document named '{}' already exists there", name)))?;

        tx.commit().await?;

        let event = if moved {
            tenant_event(ActivityAction::DocumentMoved, actor, tenant, updated.id, &updated.name).with_details(json!({
                "from_folder_id": current.folder_id,
                "to_folder_id": updated.folder_id,
                "changed": changed,
            }))
        } else {
            tenant_event(ActivityAction::DocumentUpdated, actor, tenant, updated.id, &updated.name)
                .with_details(json!({ "changed": changed }))
        };
        self.pipeline.dispatch(event);

        Ok(updated)
    }

    pub async fn trash_document(&self, tenant: &Tenant, actor: &User, id: Uuid) -> ServiceResult<Document> {
        let document = sqlx::query_as::<_, Document>(
            "UPDATE documents SET trashed_at = now(), updated_at = now(), updated_by = $3 \
             WHERE id = $1 AND tenant_id = $2 AND trashed_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(tenant.id)
        .bind(actor.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Document"))?;

        self.pipeline.dispatch(tenant_event(
            ActivityAction::DocumentTrashed,
            actor,
            tenant,
            document.id,
            &document.name,
        ));
        Ok(document)
    }

    pub async fn restore_document(&self, tenant: &Tenant, actor: &User, id: Uuid) -> ServiceResult<Document> {
        let mut tx = self.pool.begin().await?;

        let trashed = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE id = $1 AND tenant_id = $2 AND trashed_at IS NOT NULL FOR UPDATE",
        )
        .bind(id)
        .bind(tenant.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Trashed document"))?;

        if let Some(folder_id) = trashed.folder_id {
            match live_folder(&mut tx, tenant.id, folder_id, false).await {
                Ok(_) => {}
                Err(ServiceError::NotFound(_)) => {
                    return Err(ServiceError::conflict("The document's folder is in the trash; restore it first"))
                }
                Err(e) => return Err(e),
            }
        }

        let document = sqlx::query_as::<_, Document>(
            "UPDATE documents SET trashed_at = NULL, updated_at = now(), updated_by = $3 \
             WHERE id = $1 AND tenant_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(tenant.id)
        .bind(actor.id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conflict_on_unique(format!(
            "A live document named '{}' already exists in the original location",
            trashed.name
        )))?;

        tx.commit().await?;

        self.pipeline.dispatch(tenant_event(
            ActivityAction::DocumentRestored,
            actor,
            tenant,
            document.id,
            &document.name,
        ));
        Ok(document)
    }

    /// Permanently remove a trashed document and its stored object. The row
    /// stays locked until the object is gone, so a concurrent restore waits
    /// and then finds nothing. When the store fails for any reason other than
    /// a missing object, the transaction rolls back and the row stays.
    pub async fn purge_document(&self, tenant: &Tenant, actor: &User, id: Uuid) -> ServiceResult<PurgedDocument> {
        let mut tx = self.pool.begin().await?;

        let document =
            sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND tenant_id = $2 FOR UPDATE")
                .bind(id)
                .bind(tenant.id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| ServiceError::not_found("Document"))?;

        if document.trashed_at.is_none() {
            return Err(ServiceError::conflict("Only trashed documents can be purged"));
        }

        sqlx::query("DELETE FROM documents WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant.id)
            .execute(&mut *tx)
            .await?;

        let object_deleted = match self.store.delete(&document.storage_key).await {
            Ok(()) => true,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!("Object {} was already gone while purging {}", document.storage_key, document.id);
                false
            }
            Err(e) => return Err(storage_failure(e)),
        };

        if let Err(e) = tx.commit().await {
            tracing::error!(
                "Object {} deleted but purge of document {} did not commit: {}",
                document.storage_key,
                document.id,
                e
            );
            return Err(e.into());
        }

        tracing::info!("Purged document {} ({})", document.id, document.storage_key);
        self.pipeline.dispatch(
            tenant_event(ActivityAction::DocumentPurged, actor, tenant, document.id, &document.name)
                .with_details(json!({ "storage_key": document.storage_key, "size_bytes": document.size_bytes })),
        );

        Ok(PurgedDocument {
            id: document.id,
            name: document.name,
            storage_key: document.storage_key,
            object_deleted,
        })
    }

    async fn find(&self, tenant_id: Uuid, id: Uuid, trash: TrashFilter) -> ServiceResult<Document> {
        let mut qb = QueryBuilder::new("SELECT * FROM documents WHERE id = ");
        qb.push_bind(id).push(" AND tenant_id = ").push_bind(tenant_id);
        qb.push(" AND ").push(trash.to_sql());

        qb.build_query_as::<Document>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Document"))
    }
}

/// Paged document query shared with folder contents
pub(crate) async fn query_documents(
    pool: &PgPool,
    tenant_id: Uuid,
    filter: &DocumentFilter,
    pagination: Pagination,
    sort: &[SortSpec],
) -> ServiceResult<Page<Document>> {
    let mut count = QueryBuilder::new("SELECT COUNT(*) FROM documents WHERE ");
    push_document_filter(&mut count, tenant_id, filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::new("SELECT * FROM documents WHERE ");
    push_document_filter(&mut select, tenant_id, filter);
    select.push(" ").push(FilterOrder::generate(sort));
    select.push(" LIMIT ").push_bind(pagination.limit());
    select.push(" OFFSET ").push_bind(pagination.offset());
    let items = select.build_query_as::<Document>().fetch_all(pool).await?;

    Ok(Page::new(items, total, pagination))
}

fn push_document_filter(qb: &mut QueryBuilder<'_, Postgres>, tenant_id: Uuid, filter: &DocumentFilter) {
    qb.push("tenant_id = ").push_bind(tenant_id);
    qb.push(" AND ").push(filter.trash.to_sql());

    if let Some(folder_id) = filter.folder_id {
        qb.push(" AND folder_id = ").push_bind(folder_id);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        qb.push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(q)))
            .push(" ESCAPE '\\'");
    }
    if let Some(ct) = filter.content_type.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        // `image/` style prefixes match a whole family
        if ct.ends_with('/') {
            qb.push(" AND content_type LIKE ").push_bind(format!("{}%", escape_like(&ct.to_ascii_lowercase())));
            qb.push(" ESCAPE '\\'");
        } else {
            qb.push(" AND content_type = ").push_bind(ct.to_ascii_lowercase());
        }
    }
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn normalize_description(description: Option<String>) -> ServiceResult<Option<String>> {
    match description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()) {
        Some(d) if d.chars().count() > MAX_DESCRIPTION_CHARS => Err(ServiceError::field(
            "description",
            format!("must be at most {} characters", MAX_DESCRIPTION_CHARS),
        )),
        other => Ok(other),
    }
}

fn storage_failure(err: StorageError) -> ServiceError {
    match err {
        StorageError::InvalidKey(key) => ServiceError::field("storage_key", key),
        other => {
            tracing::error!("Object store failure: {}", other);
            ServiceError::StorageUnavailable(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("100%_done\\"), "100\\%\\_done\\\\");
        assert_eq!(escape_like("report"), "report");
    }

    #[test]
    fn descriptions_are_trimmed_and_blank_becomes_none() {
        assert_eq!(normalize_description(Some("  notes ".to_string())).unwrap(), Some("notes".to_string()));
        assert_eq!(normalize_description(Some("   ".to_string())).unwrap(), None);
        assert_eq!(normalize_description(None).unwrap(), None);
        assert!(normalize_description(Some("x".repeat(MAX_DESCRIPTION_CHARS + 1))).is_err());
    }

    #[test]
    fn missing_objects_are_not_storage_outages() {
        assert!(matches!(
            storage_failure(StorageError::Io(std::io::Error::other("disk gone"))),
            ServiceError::StorageUnavailable(_)
        ));
        assert!(matches!(
            storage_failure(StorageError::InvalidKey("x".to_string())),
            ServiceError::InvalidField { field: "storage_key", .. }
        ));
    }
}
