//! Outbound mail. Delivery is fire-and-forget: callers spawn the send and
//! only log failures.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail relay request failed")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, recipient: &str) -> Result<(), MailError>;
}

/// Posts messages to an HTTP mail relay (Resend-style JSON API).
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send_welcome(&self, recipient: &str) -> Result<(), MailError> {
        if self.api_url.is_empty() {
            tracing::debug!(recipient, "mail relay not configured, skipping welcome mail");
            return Ok(());
        }

        self.http
            .post(self.api_url.as_str())
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": recipient,
                "subject": "Welcome to Budget Tracker",
                "text": "Welcome! Create your first budget and start recording \
                         incomes and expenses to see where your money goes.",
            }))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(recipient, "welcome mail sent");
        Ok(())
    }
}
