//! WebSocket client for the OpenAI Realtime API.
//!
//! The relay owns one model socket per call. Connection and the initial
//! session bootstrap live here; frame pumping is driven by the relay engine,
//! which takes the split halves of the socket.
//!
//! # Connection
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Auth: `Authorization: Bearer <key>` plus `OpenAI-Beta: realtime=v1`

use futures_util::SinkExt;
use futures_util::stream::{SplitSink, SplitStream};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::config::RealtimeModel;
use super::messages::ClientEvent;

/// Errors from the model socket.
#[derive(Debug, Error)]
pub enum RealtimeError {
    /// WebSocket handshake with the model endpoint failed
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Endpoint URL could not be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// WebSocket transport error after the handshake
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Event could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for model socket operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;

/// Write half of a model socket.
pub type ModelSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a model socket.
pub type ModelStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// A connected model socket.
pub struct ModelSocket {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ModelSocket {
    /// Connect to the realtime endpoint with auth headers.
    ///
    /// `endpoint` is the base URL without the model query parameter; tests
    /// point it at a local mock server.
    pub async fn connect(
        endpoint: &str,
        api_key: &str,
        model: RealtimeModel,
    ) -> RealtimeResult<Self> {
        let url = format!("{}?model={}", endpoint, model.as_str());
        let parsed =
            Url::parse(&url).map_err(|e| RealtimeError::InvalidEndpoint(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| RealtimeError::InvalidEndpoint("missing host".to_string()))?
            .to_string();

        let request = http::Request::builder()
            .uri(parsed.as_str())
            .header("Authorization", format!("Bearer {api_key}"))
            .header("OpenAI-Beta", "realtime=v1")
            .header(
                "Sec-WebSocket-Key",
                tungstenite::handshake::client::generate_key(),
            )
            .header("Sec-WebSocket-Version", "13")
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Host", host)
            .body(())
            .map_err(|e| RealtimeError::Handshake(e.to_string()))?;

        let (inner, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| RealtimeError::Handshake(e.to_string()))?;

        tracing::info!("Connected to realtime model endpoint");
        Ok(Self { inner })
    }

    /// Send a client event as a JSON text frame.
    pub async fn send_event(&mut self, event: &ClientEvent) -> RealtimeResult<()> {
        let json =
            serde_json::to_string(event).map_err(|e| RealtimeError::Serialization(e.to_string()))?;
        self.inner
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| RealtimeError::WebSocket(e.to_string()))
    }

    /// Split into write and read halves for the relay pumps.
    pub fn split(self) -> (ModelSink, ModelStream) {
        use futures_util::StreamExt;
        self.inner.split()
    }
}
