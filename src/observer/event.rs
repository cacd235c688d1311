use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::models::User;
use crate::types::ActivityAction;

/// Who performed an action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// A completed mutation, handed to the observer pipeline after the
/// database work has committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub tenant_name: Option<String>,
    pub actor: Actor,
    pub action: ActivityAction,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub details: Value,
    pub occurred_at: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(action: ActivityAction, actor: Actor, entity_id: Uuid, entity_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tenant_id: None,
            tenant_name: None,
            actor,
            action,
            entity_id,
            entity_name: entity_name.into(),
            details: json!({}),
            occurred_at: Utc::now(),
        }
    }

    pub fn in_tenant(mut self, tenant_id: Uuid, tenant_name: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id);
        self.tenant_name = Some(tenant_name.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}
