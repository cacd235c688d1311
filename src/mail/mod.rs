//! Outbound email for activity notifications. Delivery is best-effort: callers
//! log failures and move on.

pub mod http;
pub mod templates;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{MailConfig, MailProvider};

pub use http::HttpMailer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail relay not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail relay rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail delivery timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "email (log mailer)");
        tracing::debug!(body = %message.text, "email body");
        Ok(())
    }
}

/// Build the configured mailer
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.provider {
        MailProvider::Log => Ok(Arc::new(LogMailer)),
        MailProvider::Http => Ok(Arc::new(HttpMailer::from_config(config)?)),
    }
}
