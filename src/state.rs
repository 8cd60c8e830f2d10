//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::notify::{Notifier, SendGridNotifier};
use crate::registry::SessionRegistry;
use crate::summarize::{OpenAiSummarizer, Summarizer};
use crate::telephony::{CallInitiator, TwilioCallInitiator};

/// State shared across all handlers.
///
/// Adapters are trait objects so tests can substitute in-memory fakes for
/// the external services.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Sessions awaiting their media stream
    pub registry: Arc<SessionRegistry>,
    /// Pooled HTTP client shared by all REST adapters
    pub http_client: reqwest::Client,
    /// Transcript summarizer
    pub summarizer: Arc<dyn Summarizer>,
    /// Summary delivery; `None` when SendGrid is not configured
    pub notifier: Option<Arc<dyn Notifier>>,
    /// Outbound call initiation
    pub call_initiator: Arc<dyn CallInitiator>,
}

impl AppState {
    /// Build production state from configuration.
    pub fn new(config: ServerConfig) -> Self {
        let http_client = reqwest::Client::new();

        let summarizer = Arc::new(
            OpenAiSummarizer::new(http_client.clone(), config.openai_api_key.clone())
                .with_model(config.summary_model.clone()),
        );

        let notifier = config.sendgrid.as_ref().map(|sendgrid| {
            Arc::new(SendGridNotifier::new(
                http_client.clone(),
                sendgrid.api_key.clone(),
                sendgrid.from_email.clone(),
                sendgrid.template_id.clone(),
            )) as Arc<dyn Notifier>
        });

        let call_initiator = Arc::new(TwilioCallInitiator::new(
            http_client.clone(),
            config.twilio_account_sid.clone(),
            config.twilio_auth_token.clone(),
            config.phone_number_from.clone(),
            config.domain.clone(),
        ));

        Self {
            config: Arc::new(config),
            registry: Arc::new(SessionRegistry::new()),
            http_client,
            summarizer,
            notifier,
            call_initiator,
        }
    }
}
