use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::auth::Role;
use crate::observer::error::ObserverError;
use crate::observer::event::ActivityEvent;
use crate::observer::traits::ObserverRing;

/// Data that flows through the observer pipeline for one event
#[derive(Debug)]
pub struct ObserverContext {
    pub event: ActivityEvent,

    // Type-safe metadata storage for cross-observer communication
    metadata: HashMap<TypeId, Box<dyn Any + Send + Sync>>,

    pub start_time: Instant,
    pub current_ring: Option<ObserverRing>,
    pub executed: Vec<&'static str>,
    pub errors: Vec<ObserverError>,
}

impl ObserverContext {
    pub fn new(event: ActivityEvent) -> Self {
        Self {
            event,
            metadata: HashMap::new(),
            start_time: Instant::now(),
            current_ring: None,
            executed: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Store typed metadata
    pub fn set_metadata<T: Send + Sync + 'static>(&mut self, data: T) {
        self.metadata.insert(TypeId::of::<T>(), Box::new(data));
    }

    /// Retrieve typed metadata
    pub fn get_metadata<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.metadata.get(&TypeId::of::<T>()).and_then(|boxed| boxed.downcast_ref::<T>())
    }

    pub fn has_metadata<T: Send + Sync + 'static>(&self) -> bool {
        self.metadata.contains_key(&TypeId::of::<T>())
    }

    pub fn add_error(&mut self, error: ObserverError) {
        self.errors.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn execution_time(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Recipients resolved by the enrichment ring, empty when none ran
    pub fn recipients(&self) -> &[Recipient] {
        self.get_metadata::<Recipients>().map(|r| r.0.as_slice()).unwrap_or(&[])
    }
}

// Strongly-typed metadata shared between rings

/// Set by the audit ring once the activity row exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityRecorded {
    pub activity_id: Uuid,
}

/// A user who should hear about an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Recipient {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub email_notifications: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients(pub Vec<Recipient>);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationsCreated(pub usize);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmailsSent {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_event;
    use crate::types::ActivityAction;

    #[test]
    fn metadata_is_keyed_by_type() {
        let mut ctx = ObserverContext::new(sample_event(ActivityAction::FolderCreated, "Invoices"));
        assert!(!ctx.has_metadata::<ActivityRecorded>());
        assert!(ctx.recipients().is_empty());

        let id = Uuid::new_v4();
        ctx.set_metadata(ActivityRecorded { activity_id: id });
        ctx.set_metadata(NotificationsCreated(3));

        assert_eq!(ctx.get_metadata::<ActivityRecorded>().map(|a| a.activity_id), Some(id));
        assert_eq!(ctx.get_metadata::<NotificationsCreated>(), Some(&NotificationsCreated(3)));
        assert!(ctx.get_metadata::<EmailsSent>().is_none());

        // Later writes replace earlier ones
        ctx.set_metadata(NotificationsCreated(5));
        assert_eq!(ctx.get_metadata::<NotificationsCreated>(), Some(&NotificationsCreated(5)));
    }
}
