//! Realtime model socket module.
//!
//! WebSocket client, configuration, and wire message types for the OpenAI
//! Realtime API. One model socket exists per active call; the relay engine
//! drives both halves of the split socket.

pub mod client;
pub mod config;
pub mod messages;

pub use client::{ModelSink, ModelSocket, ModelStream, RealtimeError, RealtimeResult};
pub use config::{
    AudioFormat, INPUT_TRANSCRIPTION_MODEL, OPENAI_REALTIME_URL, RealtimeModel, Voice,
};
pub use messages::{
    ApiError, ClientEvent, ContentPart, ConversationItem, InputAudioTranscription, ServerEvent,
    SessionConfig, SessionInfo, TurnDetection,
};
