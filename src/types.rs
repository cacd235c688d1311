/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of entities that appear in activity records and notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Tenant,
    User,
    Folder,
    Document,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tenant => "tenant",
            EntityKind::User => "user",
            EntityKind::Folder => "folder",
            EntityKind::Document => "document",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutations that are fanned out to activity log, notifications and email
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityAction {
    #[serde(rename = "document.created")] DocumentCreated,
    #[serde(rename = "document.updated")] DocumentUpdated,
    #[serde(rename = "document.moved")] DocumentMoved,
    #[serde(rename = "document.trashed")] DocumentTrashed,
    #[serde(rename = "document.restored")] DocumentRestored,
    #[serde(rename = "document.purged")] DocumentPurged,

    #[serde(rename = "folder.created")] FolderCreated,
    #[serde(rename = "folder.renamed")] FolderRenamed,
    #[serde(rename = "folder.moved")] FolderMoved,
    #[serde(rename = "folder.trashed")] FolderTrashed,
    #[serde(rename = "folder.restored")] FolderRestored,

    #[serde(rename = "user.created")] UserCreated,
    #[serde(rename = "user.updated")] UserUpdated,
    #[serde(rename = "user.deactivated")] UserDeactivated,

    #[serde(rename = "tenant.created")] TenantCreated,
    #[serde(rename = "tenant.updated")] TenantUpdated,
    #[serde(rename = "tenant.deactivated")] TenantDeactivated,
    #[serde(rename = "tenant.restored")] TenantRestored,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        use ActivityAction::*;
        match self {
            DocumentCreated => "document.created",
            DocumentUpdated => "document.updated",
            DocumentMoved => "document.moved",
            DocumentTrashed => "document.trashed",
            DocumentRestored => "document.restored",
            DocumentPurged => "document.purged",
            FolderCreated => "folder.created",
            FolderRenamed => "folder.renamed",
            FolderMoved => "folder.moved",
            FolderTrashed => "folder.trashed",
            FolderRestored => "folder.restored",
            UserCreated => "user.created",
            UserUpdated => "user.updated",
            UserDeactivated => "user.deactivated",
            TenantCreated => "tenant.created",
            TenantUpdated => "tenant.updated",
            TenantDeactivated => "tenant.deactivated",
            TenantRestored => "tenant.restored",
        }
    }

    pub fn entity(&self) -> EntityKind {
        use ActivityAction::*;
        match self {
            DocumentCreated | DocumentUpdated | DocumentMoved | DocumentTrashed | DocumentRestored
            | DocumentPurged => EntityKind::Document,
            FolderCreated | FolderRenamed | FolderMoved | FolderTrashed | FolderRestored => EntityKind::Folder,
            UserCreated | UserUpdated | UserDeactivated => EntityKind::User,
            TenantCreated | TenantUpdated | TenantDeactivated | TenantRestored => EntityKind::Tenant,
        }
    }

    /// Past-tense verb used in notification titles and email subjects
    pub fn verb(&self) -> &'static str {
        use ActivityAction::*;
        match self {
            DocumentCreated | FolderCreated | UserCreated | TenantCreated => "created",
            DocumentUpdated | UserUpdated | TenantUpdated => "updated",
            DocumentMoved | FolderMoved => "moved",
            FolderRenamed => "renamed",
            DocumentTrashed | FolderTrashed => "moved to trash",
            DocumentRestored | FolderRestored | TenantRestored => "restored",
            DocumentPurged => "permanently deleted",
            UserDeactivated | TenantDeactivated => "deactivated",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names_match_serde_representation() {
        let actions = [
            ActivityAction::DocumentCreated,
            ActivityAction::FolderTrashed,
            ActivityAction::UserDeactivated,
            ActivityAction::TenantRestored,
        ];
        for action in actions {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, serde_json::Value::String(action.as_str().to_string()));
        }
    }

    #[test]
    fn action_entity_follows_prefix() {
        assert_eq!(ActivityAction::DocumentPurged.entity(), EntityKind::Document);
        assert_eq!(ActivityAction::FolderMoved.entity(), EntityKind::Folder);
        assert_eq!(ActivityAction::TenantCreated.entity(), EntityKind::Tenant);
        assert!(ActivityAction::FolderRenamed.as_str().starts_with("folder."));
    }
}
