// Built-in observers, one per ring

pub mod activity_log;
pub mod email;
pub mod in_app;
pub mod recipients;

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::{MailConfig, NotificationConfig};
use crate::mail::Mailer;
use crate::observer::pipeline::ObserverPipeline;

pub use activity_log::ActivityLogObserver;
pub use email::EmailNotificationObserver;
pub use in_app::InAppNotificationObserver;
pub use recipients::{select_recipients, RecipientObserver};

/// Pipeline wired the way the server runs it. The activity log is always
/// written; fan-out observers are registered only when notifications are on.
pub fn standard_pipeline(
    pool: PgPool,
    mailer: Arc<dyn Mailer>,
    notifications: &NotificationConfig,
    mail: &MailConfig,
) -> ObserverPipeline {
    let mut pipeline = ObserverPipeline::new(Duration::from_millis(notifications.observer_timeout_ms));

    pipeline.register_observer(Arc::new(ActivityLogObserver::new(pool.clone())));

    if notifications.enabled {
        pipeline.register_observer(Arc::new(RecipientObserver::new(pool.clone())));
        pipeline.register_observer(Arc::new(InAppNotificationObserver::new(pool)));
        if notifications.email_enabled {
            pipeline.register_observer(Arc::new(EmailNotificationObserver::new(
                mailer,
                mail.from_address.clone(),
                Duration::from_secs(mail.timeout_secs),
            )));
        }
    } else {
        tracing::info!("Notifications disabled; only the activity log observer is registered");
    }

    pipeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::mail::LogMailer;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new().connect_lazy("postgres://localhost:1/docvault_test").unwrap()
    }

    #[tokio::test]
    async fn fan_out_follows_notification_settings() {
        let mut config = AppConfig::development();

        let full = standard_pipeline(lazy_pool(), Arc::new(LogMailer), &config.notifications, &config.mail);
        assert_eq!(full.observer_count(), 4);

        config.notifications.email_enabled = false;
        let no_email = standard_pipeline(lazy_pool(), Arc::new(LogMailer), &config.notifications, &config.mail);
        assert_eq!(no_email.observer_count(), 3);

        config.notifications.enabled = false;
        let audit_only = standard_pipeline(lazy_pool(), Arc::new(LogMailer), &config.notifications, &config.mail);
        assert_eq!(audit_only.observer_count(), 1);
    }
}
