//! Media stream WebSocket handler.
//!
//! `GET /media-stream/{session_id}` is the endpoint the dialed call streams
//! its audio to. The handler claims the session, opens the model socket,
//! bootstraps the model session, and hands both sockets to the relay engine.
//! When the relay stops, the transcript is summarized and the summary
//! emailed, both best-effort.

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::core::realtime::{
    AudioFormat, ClientEvent, ConversationItem, INPUT_TRANSCRIPTION_MODEL,
    InputAudioTranscription, ModelSink, ModelSocket, SessionConfig, TurnDetection,
};
use crate::core::relay::{
    EMPTY_TRANSCRIPT_SUMMARY, RelayOutcome, SUMMARY_FAILURE_FALLBACK, relay_streams,
};
use crate::registry::SessionSettings;
use crate::state::AppState;

/// Buffer size for the per-direction frame channels.
const CHANNEL_BUFFER_SIZE: usize = 1024;

const GREETING_PROMPT: &str = "Please begin by greeting the user.";

/// Media stream WebSocket handler.
///
/// Unknown or already-claimed session ids are rejected before the upgrade.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(settings) = state.registry.take(&session_id) else {
        warn!(session_id = %session_id, "No session found for media stream, rejecting");
        return StatusCode::NOT_FOUND.into_response();
    };

    info!(session_id = %session_id, "Media stream connection accepted");
    ws.on_upgrade(move |socket| handle_media_socket(socket, state, settings, session_id))
}

/// Drive one call end to end.
async fn handle_media_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    settings: SessionSettings,
    session_id: String,
) {
    let mut model_socket = match ModelSocket::connect(
        &state.config.realtime_endpoint,
        &state.config.openai_api_key,
        state.config.realtime_model,
    )
    .await
    {
        Ok(socket) => socket,
        Err(e) => {
            error!(session_id = %session_id, "Model socket connect failed: {e}");
            let mut socket = socket;
            let _ = socket.close().await;
            return;
        }
    };

    if let Err(e) = bootstrap_model_session(&mut model_socket, &settings).await {
        error!(session_id = %session_id, "Model session bootstrap failed: {e}");
        let mut socket = socket;
        let _ = socket.close().await;
        return;
    }

    let (mut telephony_sink, telephony_stream) = socket.split();
    let (model_sink, model_stream) = model_socket.split();

    // Adapt both sockets to the text-frame streams the relay engine pumps.
    let telephony_rx = Box::pin(telephony_stream.filter_map(|msg| async move {
        match msg {
            Ok(Message::Text(text)) => Some(text.to_string()),
            _ => None,
        }
    }));
    let model_rx = Box::pin(model_stream.filter_map(|msg| async move {
        match msg {
            Ok(tokio_tungstenite::tungstenite::Message::Text(text)) => Some(text.to_string()),
            _ => None,
        }
    }));

    let (telephony_tx, mut telephony_out) = mpsc::channel::<String>(CHANNEL_BUFFER_SIZE);
    let (model_tx, mut model_out) = mpsc::channel::<String>(CHANNEL_BUFFER_SIZE);

    // Writer tasks end when the relay drops the senders; each closes its
    // socket on the way out.
    let telephony_writer = tokio::spawn(async move {
        while let Some(frame) = telephony_out.recv().await {
            if telephony_sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = telephony_sink.close().await;
    });
    let model_writer = tokio::spawn(async move {
        let mut sink: ModelSink = model_sink;
        while let Some(frame) = model_out.recv().await {
            if sink
                .send(tokio_tungstenite::tungstenite::Message::Text(frame.into()))
                .await
                .is_err()
            {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let transcript = relay_streams(telephony_rx, telephony_tx, model_rx, model_tx).await;
    info!(
        session_id = %session_id,
        entries = transcript.len(),
        "Relay finished"
    );

    let _ = telephony_writer.await;
    let _ = model_writer.await;

    finish_call(&state, &settings, &session_id, RelayOutcome::from(transcript)).await;
}

/// Configure the model session and request the opening response.
async fn bootstrap_model_session(
    socket: &mut ModelSocket,
    settings: &SessionSettings,
) -> crate::core::realtime::RealtimeResult<()> {
    socket
        .send_event(&ClientEvent::SessionUpdate {
            session: SessionConfig {
                instructions: Some(settings.instructions.clone()),
                voice: Some(settings.voice.as_str().to_string()),
                input_audio_format: Some(AudioFormat::G711Ulaw.as_str().to_string()),
                output_audio_format: Some(AudioFormat::G711Ulaw.as_str().to_string()),
                input_audio_transcription: Some(InputAudioTranscription {
                    model: INPUT_TRANSCRIPTION_MODEL.to_string(),
                }),
                turn_detection: Some(TurnDetection::server_vad()),
            },
        })
        .await?;
    socket
        .send_event(&ClientEvent::ConversationItemCreate {
            item: ConversationItem::user_text(GREETING_PROMPT),
        })
        .await?;
    socket.send_event(&ClientEvent::ResponseCreate {}).await
}

/// Summarize and deliver, substituting fallbacks on failure.
async fn finish_call(
    state: &AppState,
    settings: &SessionSettings,
    session_id: &str,
    outcome: RelayOutcome,
) {
    let summary = match outcome.summary_input() {
        None => {
            debug!(session_id = %session_id, "Empty transcript, skipping summarization");
            EMPTY_TRANSCRIPT_SUMMARY.to_string()
        }
        Some(transcript) => match state.summarizer.summarize(&transcript).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(session_id = %session_id, "Summarization failed: {e}");
                SUMMARY_FAILURE_FALLBACK.to_string()
            }
        },
    };
    info!(session_id = %session_id, "Call summary: {summary}");

    match (&state.notifier, &settings.notify_email) {
        (Some(notifier), Some(email)) => {
            if let Err(e) = notifier.notify(email, &summary).await {
                error!(session_id = %session_id, "Summary delivery failed: {e}");
            }
        }
        _ => {
            debug!(session_id = %session_id, "Summary delivery not configured, skipping");
        }
    }
}
