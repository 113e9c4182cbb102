//! Outgoing email through a transactional email provider.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::config::MailConfig;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum MailError {
    #[error("email provider request failed: {0}")]
    #[diagnostic(code(lumen::mail::http))]
    Http(#[from] reqwest::Error),

    #[error("email provider answered {status}: {body}")]
    #[diagnostic(code(lumen::mail::rejected))]
    Rejected { status: u16, body: String },
}

/// A well-formed address whose domain has at least one dot, so
/// `someone@localhost` is refused.
pub fn is_valid_address(address: &str) -> bool {
    address.validate_email()
        && address
            .rsplit_once('@')
            .is_some_and(|(_, domain)| domain.contains('.'))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends `email` once and returns the provider's message id.
    async fn send(&self, email: &Email) -> Result<String, MailError>;
}

/// Picks the HTTP provider when an API key is configured, otherwise logs.
pub fn from_config(config: &MailConfig) -> Arc<dyn Mailer> {
    match &config.api_key {
        Some(key) => Arc::new(HttpMailer::new(&config.api_url, key)),
        None => {
            tracing::warn!("no mail api key configured, contact messages will only be logged");
            Arc::new(LogMailer)
        }
    }
}

/// Resend-style JSON API: `POST {api_url}/emails` answering `{ "id": .. }`.
pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
}

#[derive(Deserialize)]
struct Sent {
    id: String,
}

impl HttpMailer {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/emails", api_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<String, MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let sent: Sent = response.json().await?;
        tracing::info!(id = %sent.id, subject = %email.subject, "email sent");
        Ok(sent.id)
    }
}

/// Writes the message to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<String, MailError> {
        let id = format!("logged-{}", Uuid::new_v4());
        tracing::info!(
            %id,
            to = ?email.to,
            reply_to = ?email.reply_to,
            subject = %email.subject,
            body = %email.text,
            "email not sent, no provider configured"
        );
        Ok(id)
    }
}
