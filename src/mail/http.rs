use async_trait::async_trait;
use std::time::Duration;

use super::{EmailMessage, MailError, Mailer};
use crate::config::MailConfig;

/// Sends mail through an HTTP relay that accepts
/// `POST {from, to, subject, text}` with a bearer API key.
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpMailer {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }

    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let endpoint = config.endpoint.clone().ok_or(MailError::NotConfigured("MAIL_ENDPOINT"))?;
        Self::new(endpoint, config.api_key.clone(), Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut request = self.client.post(&self.endpoint).json(message);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(to = %message.to, status = status.as_u16(), "email accepted by relay");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(512).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, MailProvider};

    #[test]
    fn requires_endpoint() {
        let mut config = AppConfig::development().mail;
        config.provider = MailProvider::Http;
        assert!(matches!(HttpMailer::from_config(&config), Err(MailError::NotConfigured(_))));

        config.endpoint = Some("https://relay.example.com/v1/send".to_string());
        let mailer = HttpMailer::from_config(&config).unwrap();
        assert_eq!(mailer.endpoint, "https://relay.example.com/v1/send");
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_transport_error() {
        let port = portpicker::pick_unused_port().unwrap();
        let mailer = HttpMailer::new(format!("http://127.0.0.1:{}/send", port), None, Duration::from_secs(2)).unwrap();
        let message = EmailMessage {
            from: "a@example.com".to_string(),
            to: "b@example.com".to_string(),
            subject: "s".to_string(),
            text: "t".to_string(),
        };
        assert!(matches!(mailer.send(&message).await, Err(MailError::Transport(_))));
    }
}
