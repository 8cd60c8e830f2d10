//! Post-call summary delivery.
//!
//! The notifier emails the call summary through the SendGrid v3 mail API
//! using a dynamic template. Like summarization, delivery is best-effort:
//! failures are logged by the caller and never affect the call itself.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

/// Default SendGrid API endpoint base.
pub const SENDGRID_API_BASE: &str = "https://api.sendgrid.com";

/// Errors from the notification backend.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    /// No recipient or credentials were configured for this call
    #[error("Notification not configured: {0}")]
    NotConfigured(&'static str),

    /// Request could not be built or sent
    #[error("Notification request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The API returned a non-success status
    #[error("Notification API error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },
}

/// Delivers a call summary to a recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send the summary to the given email address.
    async fn notify(&self, to_email: &str, summary: &str) -> Result<(), NotificationError>;
}

/// [`Notifier`] backed by the SendGrid v3 mail API.
pub struct SendGridNotifier {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    from_email: String,
    template_id: String,
}

impl SendGridNotifier {
    /// Create a notifier against the default SendGrid endpoint.
    pub fn new(
        http_client: reqwest::Client,
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Self {
        Self::with_api_base(http_client, SENDGRID_API_BASE, api_key, from_email, template_id)
    }

    /// Create a notifier against a custom endpoint base.
    pub fn with_api_base(
        http_client: reqwest::Client,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        from_email: impl Into<String>,
        template_id: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            from_email: from_email.into(),
            template_id: template_id.into(),
        }
    }
}

#[derive(Serialize)]
struct MailSendRequest<'a> {
    from: EmailAddress<'a>,
    personalizations: Vec<Personalization<'a>>,
    template_id: &'a str,
}

#[derive(Serialize)]
struct EmailAddress<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct Personalization<'a> {
    to: Vec<EmailAddress<'a>>,
    dynamic_template_data: serde_json::Value,
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn notify(&self, to_email: &str, summary: &str) -> Result<(), NotificationError> {
        if to_email.is_empty() {
            return Err(NotificationError::NotConfigured("recipient email"));
        }

        let request = MailSendRequest {
            from: EmailAddress {
                email: &self.from_email,
            },
            personalizations: vec![Personalization {
                to: vec![EmailAddress { email: to_email }],
                dynamic_template_data: json!({ "summary": summary }),
            }],
            template_id: &self.template_id,
        };

        let response = self
            .http_client
            .post(format!("{}/v3/mail/send", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(Duration::from_secs(30))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        info!(to = %to_email, "Summary email accepted for delivery");
        Ok(())
    }
}
