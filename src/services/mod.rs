pub mod activity_service;
pub mod document_service;
pub mod error;
pub mod folder_service;
pub mod hierarchy;
pub mod notification_service;
pub mod tenant_service;
pub mod user_service;
pub mod validation;

pub use activity_service::{ActivityFilter, ActivityService};
pub use document_service::{CreateDocument, DocumentFilter, DocumentService, UpdateDocument};
pub use error::{ServiceError, ServiceResult};
pub use folder_service::{CreateFolder, FolderContents, FolderDetail, FolderService, SubtreeChange, UpdateFolder};
pub use notification_service::NotificationService;
pub use tenant_service::{CreateTenant, NewTenantAdmin, TenantService, TenantWithAdmin, UpdateTenant};
pub use user_service::{CreateUser, UpdateMe, UpdateUser, UserService};

use uuid::Uuid;

use crate::database::models::{Tenant, User};
use crate::observer::{ActivityEvent, Actor};
use crate::types::ActivityAction;

/// Activity event for a mutation inside `tenant`
pub(crate) fn tenant_event(
    action: ActivityAction,
    actor: &User,
    tenant: &Tenant,
    entity_id: Uuid,
    entity_name: impl Into<String>,
) -> ActivityEvent {
    ActivityEvent::new(action, Actor::from(actor), entity_id, entity_name).in_tenant(tenant.id, tenant.name.clone())
}

/// Deserialize helper for PATCH bodies: distinguishes an absent field
/// (`None`) from an explicit `null` (`Some(None)`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        parent_id: Option<Option<Uuid>>,
    }

    #[test]
    fn double_option_separates_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.parent_id, None);

        let null: Patch = serde_json::from_str(r#"{"parent_id": null}"#).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"parent_id": "{}"}}"#, id)).unwrap();
        assert_eq!(set.parent_id, Some(Some(id)));
    }
}
