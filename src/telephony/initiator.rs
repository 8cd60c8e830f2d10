//! Outbound call initiation through the Twilio REST API.
//!
//! Before dialing, the destination number is checked against the account's
//! own numbers and verified caller ids. The call is created with inline
//! TwiML that connects the answered call's media stream back to this
//! service at `/media-stream/{session_id}`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Default Twilio API endpoint base.
pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

/// WebSocket URL a dialed call should stream its media to.
pub fn relay_endpoint_for(domain: &str, session_id: &str) -> String {
    format!("wss://{domain}/media-stream/{session_id}")
}

fn stream_twiml(domain: &str, session_id: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><Response><Connect><Stream url="{}" /></Connect></Response>"#,
        relay_endpoint_for(domain, session_id)
    )
}

/// Errors from call initiation.
#[derive(Debug, thiserror::Error)]
pub enum CallInitiationError {
    /// Destination is neither an account number nor a verified caller id
    #[error("The number {0} is not recognized as a valid outgoing number or caller ID")]
    NumberNotAllowed(String),

    /// Request could not be built or sent
    #[error("Telephony request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The API returned a non-success status
    #[error("Telephony API error ({status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },
}

/// Places an outbound call that streams its media to the given session.
#[async_trait]
pub trait CallInitiator: Send + Sync {
    /// Dial `to_number` and connect it to `/media-stream/{session_id}`.
    ///
    /// Returns the provider's call identifier.
    async fn start_call(
        &self,
        to_number: &str,
        session_id: &str,
    ) -> Result<String, CallInitiationError>;
}

/// [`CallInitiator`] backed by the Twilio REST API.
pub struct TwilioCallInitiator {
    http_client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    domain: String,
}

impl TwilioCallInitiator {
    /// Create an initiator against the default Twilio endpoint.
    pub fn new(
        http_client: reqwest::Client,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self::with_api_base(
            http_client,
            TWILIO_API_BASE,
            account_sid,
            auth_token,
            from_number,
            domain,
        )
    }

    /// Create an initiator against a custom endpoint base.
    pub fn with_api_base(
        http_client: reqwest::Client,
        api_base: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        from_number: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            from_number: from_number.into(),
            domain: domain.into(),
        }
    }

    fn account_url(&self, resource: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/{resource}",
            self.api_base, self.account_sid
        )
    }

    /// Whether the destination belongs to this account or its verified
    /// caller ids.
    async fn is_number_allowed(&self, to_number: &str) -> Result<bool, CallInitiationError> {
        let incoming: IncomingPhoneNumbersPage = self
            .fetch_page("IncomingPhoneNumbers.json", to_number)
            .await?;
        if !incoming.incoming_phone_numbers.is_empty() {
            return Ok(true);
        }

        let verified: OutgoingCallerIdsPage = self
            .fetch_page("OutgoingCallerIds.json", to_number)
            .await?;
        Ok(!verified.outgoing_caller_ids.is_empty())
    }

    async fn fetch_page<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        phone_number: &str,
    ) -> Result<T, CallInitiationError> {
        let response = self
            .http_client
            .get(self.account_url(resource))
            .query(&[("PhoneNumber", phone_number)])
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallInitiationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

#[derive(Deserialize)]
struct IncomingPhoneNumbersPage {
    #[serde(default)]
    incoming_phone_numbers: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct OutgoingCallerIdsPage {
    #[serde(default)]
    outgoing_caller_ids: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct CallResource {
    sid: String,
}

#[async_trait]
impl CallInitiator for TwilioCallInitiator {
    async fn start_call(
        &self,
        to_number: &str,
        session_id: &str,
    ) -> Result<String, CallInitiationError> {
        if !self.is_number_allowed(to_number).await? {
            return Err(CallInitiationError::NumberNotAllowed(
                to_number.to_string(),
            ));
        }

        let twiml = stream_twiml(&self.domain, session_id);
        debug!(to = %to_number, session_id = %session_id, "Creating outbound call");

        let response = self
            .http_client
            .post(self.account_url("Calls.json"))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[
                ("From", self.from_number.as_str()),
                ("To", to_number),
                ("Twiml", twiml.as_str()),
            ])
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallInitiationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let call: CallResource = response.json().await?;
        info!(call_sid = %call.sid, to = %to_number, "Outbound call created");
        Ok(call.sid)
    }
}
