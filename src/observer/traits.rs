use async_trait::async_trait;
use std::time::Duration;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::event::ActivityEvent;

/// Observer rings, executed in declaration order for every event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ObserverRing {
    Audit = 0,        // Persist the activity record
    Enrichment = 1,   // Resolve who should hear about it
    Notification = 2, // In-app notification rows
    Integration = 3,  // Email and other outbound channels
}

impl ObserverRing {
    pub const ALL: [ObserverRing; 4] = [
        ObserverRing::Audit,
        ObserverRing::Enrichment,
        ObserverRing::Notification,
        ObserverRing::Integration,
    ];
}

#[async_trait]
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which ring this observer belongs to
    fn ring(&self) -> ObserverRing;

    /// Check if observer applies to this event
    fn applies_to(&self, _event: &ActivityEvent) -> bool {
        true
    }

    /// Per-observer timeout; the pipeline default applies when `None`
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}
