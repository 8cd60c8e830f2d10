//! Call initiation endpoint.
//!
//! `POST /call_custom` registers a session with the caller's instructions,
//! voice, and summary recipient, then dials the destination in the
//! background. The response returns immediately with the session id; dial
//! failures are logged, not reported to the caller.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::core::realtime::Voice;
use crate::registry::SessionSettings;
use crate::state::AppState;

/// Request body for initiating a call.
#[derive(Debug, Clone, Deserialize)]
pub struct CallRequest {
    /// Destination number in E.164 format
    pub phone_number: String,
    /// Recipient for the post-call summary email
    pub email: String,
    /// System instructions for the voice model
    pub system_message: String,
    /// Voice name; falls back to the server default when unrecognized
    #[serde(default)]
    pub voice: Option<String>,
}

/// Response body for an accepted call.
#[derive(Debug, Clone, Serialize)]
pub struct CallResponse {
    /// Human-readable status
    pub message: String,
    /// Session id the dialed call will stream media to
    pub session_id: String,
}

/// Error body for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description
    pub error: String,
}

/// Initiate an outbound call.
pub async fn call_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CallRequest>,
) -> Result<Json<CallResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.phone_number.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "phone_number must not be empty".to_string(),
            }),
        ));
    }

    let voice = match request.voice.as_deref() {
        Some(name) => Voice::from_str_or_default(name),
        None => state.config.default_voice,
    };

    let session_id = state.registry.create(SessionSettings {
        instructions: request.system_message,
        voice,
        notify_email: Some(request.email).filter(|e| !e.trim().is_empty()),
    });
    info!(
        session_id = %session_id,
        to = %request.phone_number,
        "Call requested"
    );

    // The dial happens in the background so the HTTP response is immediate.
    let initiator = state.call_initiator.clone();
    let phone_number = request.phone_number.clone();
    let task_session_id = session_id.clone();
    tokio::spawn(async move {
        match initiator.start_call(&phone_number, &task_session_id).await {
            Ok(call_sid) => info!(
                session_id = %task_session_id,
                call_sid = %call_sid,
                "Started call"
            ),
            Err(e) => error!(
                session_id = %task_session_id,
                to = %phone_number,
                "Failed to start call: {e}"
            ),
        }
    });

    Ok(Json(CallResponse {
        message: format!("Call initiated to {}", request.phone_number),
        session_id,
    }))
}

/// Liveness probe.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Voice relay server is running" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_request_voice_defaults_to_none() {
        let json = r#"{
            "phone_number": "+15550002222",
            "email": "ops@example.com",
            "system_message": "You are a helpful assistant."
        }"#;
        let request: CallRequest = serde_json::from_str(json).unwrap();
        assert!(request.voice.is_none());
    }

    #[test]
    fn test_call_response_shape() {
        let response = CallResponse {
            message: "Call initiated to +15550002222".to_string(),
            session_id: "abc123".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["message"], "Call initiated to +15550002222");
        assert_eq!(json["session_id"], "abc123");
    }
}
