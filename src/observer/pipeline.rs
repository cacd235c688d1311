// Observer pipeline: runs registered observers for a completed activity
// event, ring by ring, off the request path.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::event::ActivityEvent;
use crate::observer::traits::{Observer, ObserverRing};

pub type ObserverBox = Arc<dyn Observer>;

pub struct ObserverPipeline {
    // Observer registry by ring; BTreeMap keeps ring order
    observers: BTreeMap<ObserverRing, Vec<ObserverBox>>,
    default_timeout: Duration,
}

impl ObserverPipeline {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            observers: BTreeMap::new(),
            default_timeout,
        }
    }

    pub fn register_observer(&mut self, observer: ObserverBox) {
        let ring = observer.ring();
        let name = observer.name();
        let ring_observers = self.observers.entry(ring).or_default();
        ring_observers.push(observer);
        ring_observers.sort_by_key(|o| o.priority());

        tracing::debug!("Registered observer '{}' for ring {:?}", name, ring);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.values().map(Vec::len).sum()
    }

    /// Run every applicable observer for `event` and return the final context.
    ///
    /// Failures and timeouts are recorded on the context and logged; the
    /// remaining observers still run.
    pub async fn run(&self, event: ActivityEvent) -> ObserverContext {
        let mut ctx = ObserverContext::new(event);

        tracing::debug!(
            "Observer pipeline starting: action={}, entity={}",
            ctx.event.action,
            ctx.event.entity_id
        );

        for ring in ObserverRing::ALL {
            ctx.current_ring = Some(ring);
            self.execute_ring(ring, &mut ctx).await;
        }

        if ctx.has_errors() {
            tracing::warn!(
                "Observer pipeline finished with {} error(s) for {} in {:?}",
                ctx.errors.len(),
                ctx.event.action,
                ctx.execution_time()
            );
        } else {
            tracing::debug!("Observer pipeline finished for {} in {:?}", ctx.event.action, ctx.execution_time());
        }

        ctx
    }

    /// Fire-and-forget: run the pipeline on a spawned task
    pub fn dispatch(self: &Arc<Self>, event: ActivityEvent) -> JoinHandle<()> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.run(event).await;
        })
    }

    async fn execute_ring(&self, ring: ObserverRing, ctx: &mut ObserverContext) {
        let Some(observers) = self.observers.get(&ring) else {
            tracing::trace!("No observers registered for ring {:?}", ring);
            return;
        };

        for observer in observers {
            if !observer.applies_to(&ctx.event) {
                tracing::trace!("Observer {} skipped for {}", observer.name(), ctx.event.action);
                continue;
            }

            let limit = observer.timeout().unwrap_or(self.default_timeout);
            let observer_start = Instant::now();

            let result = timeout(limit, observer.execute(ctx)).await;
            let execution_time = observer_start.elapsed();
            ctx.executed.push(observer.name());

            match result {
                Ok(Ok(())) => {
                    tracing::debug!("Observer: {} completed in {:?}", observer.name(), execution_time);
                }
                Ok(Err(error)) => {
                    tracing::warn!("Observer: {} failed in {:?}: {}", observer.name(), execution_time, error);
                    ctx.add_error(error);
                }
                Err(_elapsed) => {
                    tracing::error!("Observer: {} timed out after {:?}", observer.name(), limit);
                    ctx.add_error(ObserverError::TimeoutError(format!(
                        "Observer {} timed out after {:?}",
                        observer.name(),
                        limit
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::context::NotificationsCreated;
    use crate::testing::sample_event;
    use crate::types::{ActivityAction, EntityKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        name: &'static str,
        ring: ObserverRing,
        priority: u8,
        log: Arc<Mutex<Vec<&'static str>>>,
        behaviour: Behaviour,
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        Succeed,
        Fail,
        Hang,
        FoldersOnly,
    }

    #[async_trait]
    impl Observer for Scripted {
        fn name(&self) -> &'static str {
            self.name
        }

        fn ring(&self) -> ObserverRing {
            self.ring
        }

        fn priority(&self) -> u8 {
            self.priority
        }

        fn applies_to(&self, event: &ActivityEvent) -> bool {
            match self.behaviour {
                Behaviour::FoldersOnly => event.action.entity() == EntityKind::Folder,
                _ => true,
            }
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_millis(50))
        }

        async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
            self.log.lock().unwrap().push(self.name);
            match self.behaviour {
                Behaviour::Fail => Err(ObserverError::MailError("relay down".to_string())),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
                _ => {
                    let seen = ctx.get_metadata::<NotificationsCreated>().map(|n| n.0).unwrap_or(0);
                    ctx.set_metadata(NotificationsCreated(seen + 1));
                    Ok(())
                }
            }
        }
    }

    fn scripted(
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
        ring: ObserverRing,
        priority: u8,
        behaviour: Behaviour,
    ) -> ObserverBox {
        Arc::new(Scripted { name, ring, priority, log: Arc::clone(log), behaviour })
    }

    #[tokio::test]
    async fn runs_rings_in_order_regardless_of_registration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new(Duration::from_secs(1));
        pipeline.register_observer(scripted(&log, "email", ObserverRing::Integration, 50, Behaviour::Succeed));
        pipeline.register_observer(scripted(&log, "in_app", ObserverRing::Notification, 50, Behaviour::Succeed));
        pipeline.register_observer(scripted(&log, "late_audit", ObserverRing::Audit, 90, Behaviour::Succeed));
        pipeline.register_observer(scripted(&log, "audit", ObserverRing::Audit, 10, Behaviour::Succeed));
        pipeline.register_observer(scripted(&log, "recipients", ObserverRing::Enrichment, 50, Behaviour::Succeed));
        assert_eq!(pipeline.observer_count(), 5);

        let ctx = pipeline.run(sample_event(ActivityAction::DocumentCreated, "q3.pdf")).await;

        let expected = vec!["audit", "late_audit", "recipients", "in_app", "email"];
        assert_eq!(*log.lock().unwrap(), expected);
        assert_eq!(ctx.executed, expected);
        assert!(!ctx.has_errors());
        // Metadata written by one ring is visible to the next
        assert_eq!(ctx.get_metadata::<NotificationsCreated>(), Some(&NotificationsCreated(5)));
    }

    #[tokio::test]
    async fn failures_and_timeouts_do_not_stop_the_pipeline() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new(Duration::from_secs(1));
        pipeline.register_observer(scripted(&log, "audit", ObserverRing::Audit, 50, Behaviour::Fail));
        pipeline.register_observer(scripted(&log, "recipients", ObserverRing::Enrichment, 50, Behaviour::Hang));
        pipeline.register_observer(scripted(&log, "email", ObserverRing::Integration, 50, Behaviour::Succeed));

        let ctx = pipeline.run(sample_event(ActivityAction::DocumentTrashed, "q3.pdf")).await;

        assert_eq!(ctx.executed, vec!["audit", "recipients", "email"]);
        assert_eq!(ctx.errors.len(), 2);
        assert!(matches!(ctx.errors[0], ObserverError::MailError(_)));
        assert!(matches!(ctx.errors[1], ObserverError::TimeoutError(_)));
    }

    #[tokio::test]
    async fn skips_observers_that_do_not_apply() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new(Duration::from_secs(1));
        pipeline.register_observer(scripted(&log, "folders", ObserverRing::Notification, 50, Behaviour::FoldersOnly));
        pipeline.register_observer(scripted(&log, "all", ObserverRing::Notification, 60, Behaviour::Succeed));

        let ctx = pipeline.run(sample_event(ActivityAction::DocumentUpdated, "q3.pdf")).await;
        assert_eq!(ctx.executed, vec!["all"]);

        let ctx = pipeline.run(sample_event(ActivityAction::FolderRenamed, "Invoices")).await;
        assert_eq!(ctx.executed, vec!["folders", "all"]);
    }

    #[tokio::test]
    async fn dispatch_runs_in_background() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = ObserverPipeline::new(Duration::from_secs(1));
        pipeline.register_observer(scripted(&log, "audit", ObserverRing::Audit, 50, Behaviour::Succeed));
        let pipeline = Arc::new(pipeline);

        pipeline
            .dispatch(sample_event(ActivityAction::FolderCreated, "Invoices"))
            .await
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["audit"]);
    }
}
