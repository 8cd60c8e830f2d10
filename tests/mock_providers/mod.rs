//! In-memory fakes for the external service adapters.
//!
//! These let endpoint and relay tests run the production handlers without
//! Twilio, OpenAI, or SendGrid credentials.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use dialbridge::config::ServerConfig;
use dialbridge::core::realtime::{RealtimeModel, Voice};
use dialbridge::notify::{NotificationError, Notifier};
use dialbridge::registry::SessionRegistry;
use dialbridge::state::AppState;
use dialbridge::summarize::{SummarizationError, Summarizer};
use dialbridge::telephony::{CallInitiationError, CallInitiator};

/// Summarizer that records its input and returns a fixed summary.
#[derive(Default)]
pub struct RecordingSummarizer {
    pub requests: Mutex<Vec<String>>,
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(&self, transcript: &str) -> Result<String, SummarizationError> {
        self.requests.lock().push(transcript.to_string());
        Ok("mock summary".to_string())
    }
}

/// Summarizer that always fails.
pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(&self, _transcript: &str) -> Result<String, SummarizationError> {
        Err(SummarizationError::EmptyResponse)
    }
}

/// Notifier that records deliveries.
#[derive(Default)]
pub struct RecordingNotifier {
    pub deliveries: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, to_email: &str, summary: &str) -> Result<(), NotificationError> {
        self.deliveries
            .lock()
            .push((to_email.to_string(), summary.to_string()));
        Ok(())
    }
}

/// Notifier that records the attempt, then fails.
#[derive(Default)]
pub struct FailingNotifier {
    pub attempts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, to_email: &str, summary: &str) -> Result<(), NotificationError> {
        self.attempts
            .lock()
            .push((to_email.to_string(), summary.to_string()));
        Err(NotificationError::Api {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Call initiator that records dials and returns a fixed call SID.
#[derive(Default)]
pub struct RecordingCallInitiator {
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CallInitiator for RecordingCallInitiator {
    async fn start_call(
        &self,
        to_number: &str,
        session_id: &str,
    ) -> Result<String, CallInitiationError> {
        self.calls
            .lock()
            .push((to_number.to_string(), session_id.to_string()));
        Ok("CAmock".to_string())
    }
}

/// Server configuration for tests, pointing the realtime socket at
/// `realtime_endpoint`.
pub fn test_config(realtime_endpoint: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        domain: "agent.test".to_string(),
        twilio_account_sid: "ACtest".to_string(),
        twilio_auth_token: "test-token".to_string(),
        phone_number_from: "+15550001111".to_string(),
        openai_api_key: "sk-test".to_string(),
        realtime_endpoint: realtime_endpoint.to_string(),
        realtime_model: RealtimeModel::default(),
        default_voice: Voice::Alloy,
        summary_model: "gpt-4o-mini".to_string(),
        sendgrid: None,
        cors_allowed_origins: None,
    }
}

/// Application state wired to the given fakes.
pub fn test_state(
    realtime_endpoint: &str,
    summarizer: Arc<dyn Summarizer>,
    notifier: Option<Arc<dyn Notifier>>,
    call_initiator: Arc<dyn CallInitiator>,
) -> Arc<AppState> {
    Arc::new(AppState {
        config: Arc::new(test_config(realtime_endpoint)),
        registry: Arc::new(SessionRegistry::new()),
        http_client: reqwest::Client::new(),
        summarizer,
        notifier,
        call_initiator,
    })
}
