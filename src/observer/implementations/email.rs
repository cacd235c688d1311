use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::mail::templates::render_activity_email;
use crate::mail::{MailError, Mailer};
use crate::observer::context::{EmailsSent, ObserverContext, Recipient};
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing};

/// Headroom between the slowest single send and the observer's own limit
const SEND_MARGIN: Duration = Duration::from_secs(2);

/// Integration ring: emails recipients who opted in. Sends run concurrently,
/// each bounded by `send_timeout`, so the observer finishes within
/// `send_timeout + SEND_MARGIN` however many recipients there are.
pub struct EmailNotificationObserver {
    mailer: Arc<dyn Mailer>,
    from_address: String,
    send_timeout: Duration,
}

impl EmailNotificationObserver {
    pub fn new(mailer: Arc<dyn Mailer>, from_address: String, send_timeout: Duration) -> Self {
        Self {
            mailer,
            from_address,
            send_timeout,
        }
    }
}

#[async_trait]
impl Observer for EmailNotificationObserver {
    fn name(&self) -> &'static str {
        "EmailNotificationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Integration
    }

    fn priority(&self) -> u8 {
        80
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.send_timeout + SEND_MARGIN)
    }

    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let (opted_in, opted_out): (Vec<&Recipient>, Vec<&Recipient>) =
            ctx.recipients().iter().partition(|r| r.email_notifications);

        let event = &ctx.event;
        let sends = opted_in.iter().map(|recipient| async move {
            let message = render_activity_email(event, &self.from_address, &recipient.email);
            let result = match timeout(self.send_timeout, self.mailer.send(&message)).await {
                Ok(result) => result,
                Err(_) => Err(MailError::TimedOut(self.send_timeout)),
            };
            (recipient, result)
        });

        let mut report = EmailsSent { skipped: opted_out.len(), ..Default::default() };
        let mut last_error = None;
        for (recipient, result) in join_all(sends).await {
            match result {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::warn!("Email to {} via {} failed: {}", recipient.email, self.mailer.name(), e);
                    report.failed += 1;
                    last_error = Some(e.to_string());
                }
            }
        }

        tracing::debug!(
            "Emails for {}: {} sent, {} failed, {} opted out",
            ctx.event.action,
            report.sent,
            report.failed,
            report.skipped
        );
        ctx.set_metadata(report);

        match last_error {
            Some(e) => Err(ObserverError::MailError(format!("{} email(s) failed, last: {}", report.failed, e))),
            None => Ok(()),
        }
    }
}
