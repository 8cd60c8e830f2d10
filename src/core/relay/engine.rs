//! Bidirectional frame relay between a telephony socket and a model socket.
//!
//! The engine is transport-agnostic: both sockets are presented as streams
//! of JSON text frames plus channel senders for the opposite direction. The
//! production handler adapts the axum and tungstenite sockets onto these;
//! tests drive the same code path with in-memory channels.
//!
//! # Concurrency
//!
//! Two pump tasks run concurrently, one per direction. Within a direction
//! frames are forwarded in strict arrival order; across directions there is
//! no ordering. Whichever pump finishes first (clean close, remote close,
//! or error) cancels a shared [`CancellationToken`]; the other pump observes
//! it at its next suspension point and stops promptly. Frames queued in the
//! cancelled direction are dropped — accepted lossy shutdown for a call
//! teardown.
//!
//! The stream SID is written once by the telephony pump and read by the
//! model pump through a `watch` channel, which gives the cross-task
//! visibility guarantee without locking. The transcript has a single writer
//! (the model pump) and is handed back by value when the pumps stop.

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::core::realtime::{ClientEvent, ServerEvent};
use crate::telephony::messages::{OutboundMediaFrame, TelephonyEvent};

use super::transcript::TranscriptAccumulator;

use base64::prelude::*;

/// Run both pumps until either side terminates, then stop the other.
///
/// Returns the transcript accumulated from model completion events. The
/// caller owns socket teardown; by the time this returns no further frame
/// is forwarded in either direction.
pub async fn relay_streams<T, M>(
    telephony_rx: T,
    telephony_tx: mpsc::Sender<String>,
    model_rx: M,
    model_tx: mpsc::Sender<String>,
) -> TranscriptAccumulator
where
    T: Stream<Item = String> + Send + Unpin + 'static,
    M: Stream<Item = String> + Send + Unpin + 'static,
{
    let cancel = CancellationToken::new();
    let (sid_tx, sid_rx) = watch::channel(None::<String>);

    let inbound = tokio::spawn(pump_telephony_to_model(
        telephony_rx,
        model_tx,
        sid_tx,
        cancel.clone(),
    ));
    let outbound = tokio::spawn(pump_model_to_telephony(
        model_rx,
        telephony_tx,
        sid_rx,
        cancel.clone(),
    ));

    let (inbound_res, outbound_res) = tokio::join!(inbound, outbound);
    if let Err(e) = inbound_res {
        warn!("Telephony pump task failed: {e}");
    }
    match outbound_res {
        Ok(transcript) => transcript,
        Err(e) => {
            warn!("Model pump task failed: {e}");
            TranscriptAccumulator::new()
        }
    }
}

/// Telephony → model pump.
///
/// `start` captures the stream SID; `media` payloads are forwarded verbatim
/// (still base64) inside an `input_audio_buffer.append` event. A frame that
/// fails to decode is treated as a graceful close.
async fn pump_telephony_to_model<T>(
    mut rx: T,
    model_tx: mpsc::Sender<String>,
    stream_sid: watch::Sender<Option<String>>,
    cancel: CancellationToken,
) where
    T: Stream<Item = String> + Unpin,
{
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = rx.next() => match frame {
                Some(frame) => frame,
                None => {
                    debug!("Telephony stream ended");
                    break;
                }
            },
        };

        let event = match serde_json::from_str::<TelephonyEvent>(&frame) {
            Ok(event) => event,
            Err(e) => {
                debug!("Undecodable telephony frame, closing: {e}");
                break;
            }
        };

        match event {
            TelephonyEvent::Start { start } => {
                debug!(stream_sid = %start.stream_sid, "Telephony stream started");
                let _ = stream_sid.send(Some(start.stream_sid));
            }
            TelephonyEvent::Media { media } => {
                let append = ClientEvent::audio_append_base64(media.payload);
                let json = match serde_json::to_string(&append) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize audio append: {e}");
                        continue;
                    }
                };
                if model_tx.send(json).await.is_err() {
                    debug!("Model sender closed, stopping telephony pump");
                    break;
                }
            }
            TelephonyEvent::Other => {}
        }
    }

    cancel.cancel();
}

/// Model → telephony pump.
///
/// Transcription completions become transcript entries; audio deltas are
/// decoded, re-encoded, and forwarded as `media` frames tagged with the
/// current stream SID. Unrecognized event types are no-ops, but a frame
/// that is not valid JSON ends the pump.
async fn pump_model_to_telephony<M>(
    mut rx: M,
    telephony_tx: mpsc::Sender<String>,
    stream_sid: watch::Receiver<Option<String>>,
    cancel: CancellationToken,
) -> TranscriptAccumulator
where
    M: Stream<Item = String> + Unpin,
{
    let mut transcript = TranscriptAccumulator::new();

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = rx.next() => match frame {
                Some(frame) => frame,
                None => {
                    debug!("Model stream ended");
                    break;
                }
            },
        };

        let event = match serde_json::from_str::<ServerEvent>(&frame) {
            Ok(event) => event,
            Err(e) => {
                warn!("Unparseable model frame, closing: {e}");
                break;
            }
        };

        match event {
            ServerEvent::TranscriptionCompleted { transcript: text, .. } => {
                debug!("User transcript: {text}");
                transcript.push_user(text);
            }
            ServerEvent::AudioTranscriptDone { transcript: text, .. } => {
                debug!("Assistant transcript: {text}");
                transcript.push_assistant(text);
            }
            ServerEvent::AudioDelta { delta, .. } => {
                let audio = match ServerEvent::decode_audio_delta(&delta) {
                    Ok(audio) => audio,
                    Err(e) => {
                        warn!("Failed to decode audio delta: {e}");
                        continue;
                    }
                };
                let frame = OutboundMediaFrame::new(
                    stream_sid.borrow().clone(),
                    BASE64_STANDARD.encode(&audio),
                );
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize media frame: {e}");
                        continue;
                    }
                };
                if telephony_tx.send(json).await.is_err() {
                    debug!("Telephony sender closed, stopping model pump");
                    break;
                }
            }
            ServerEvent::Error { error } => {
                warn!(
                    "Model error event: {} - {}",
                    error.error_type, error.message
                );
            }
            ServerEvent::SessionCreated { session } => {
                debug!("Model session created: {}", session.id);
            }
            ServerEvent::SessionUpdated { .. } | ServerEvent::Other => {}
        }
    }

    cancel.cancel();
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::time::Duration;

    fn media_frame(payload: &str) -> String {
        format!(r#"{{"event":"media","media":{{"payload":"{payload}"}}}}"#)
    }

    fn start_frame(sid: &str) -> String {
        format!(r#"{{"event":"start","start":{{"streamSid":"{sid}"}}}}"#)
    }

    fn audio_delta(delta: &str) -> String {
        format!(
            r#"{{"type":"response.audio.delta","response_id":"r1","item_id":"i1","delta":"{delta}"}}"#
        )
    }

    /// A side that stays open until the other pump cancels it.
    fn open_side() -> impl Stream<Item = String> + Send + Unpin + 'static {
        stream::pending()
    }

    async fn drain(mut rx: mpsc::Receiver<String>) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(frame) = rx.recv().await {
            out.push(frame);
        }
        out
    }

    #[tokio::test]
    async fn test_media_frames_forwarded_in_order() {
        let payloads = ["AAEC", "AwQF", "BgcI"];
        let frames: Vec<String> = std::iter::once(start_frame("MZ1"))
            .chain(payloads.iter().map(|p| media_frame(p)))
            .collect();
        let (telephony_tx, _telephony_rx) = mpsc::channel(16);
        let (model_tx, model_rx) = mpsc::channel(16);

        relay_streams(stream::iter(frames), telephony_tx, open_side(), model_tx).await;

        let sent = drain(model_rx).await;
        assert_eq!(sent.len(), 3);
        for (json, payload) in sent.iter().zip(payloads) {
            let v: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(v["type"], "input_audio_buffer.append");
            assert_eq!(v["audio"], payload);
        }
    }

    #[tokio::test]
    async fn test_media_before_start_still_forwarded() {
        let frames = vec![media_frame("AAEC"), start_frame("MZ1")];
        let (telephony_tx, _telephony_rx) = mpsc::channel(16);
        let (model_tx, model_rx) = mpsc::channel(16);

        relay_streams(stream::iter(frames), telephony_tx, open_side(), model_tx).await;

        let sent = drain(model_rx).await;
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn test_audio_delta_round_trip_and_stream_sid() {
        let original = vec![0u8, 1, 2, 250, 251, 252];
        let encoded = BASE64_STANDARD.encode(&original);

        // Telephony sends start and stays open; the model delta is delayed
        // so the stream SID is already recorded when it arrives.
        let telephony_frames = stream::iter(vec![start_frame("MZ42")]).chain(stream::pending());
        let delta = audio_delta(&encoded);
        let model_frames = Box::pin(stream::once(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            delta
        }));
        let (telephony_tx, telephony_rx) = mpsc::channel(16);
        let (model_tx, _model_rx) = mpsc::channel(16);

        let transcript =
            relay_streams(telephony_frames, telephony_tx, model_frames, model_tx).await;

        assert!(transcript.is_empty());
        let sent = drain(telephony_rx).await;
        assert_eq!(sent.len(), 1);
        let v: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(v["event"], "media");
        assert_eq!(v["streamSid"], "MZ42");
        let payload = v["media"]["payload"].as_str().unwrap();
        assert_eq!(BASE64_STANDARD.decode(payload).unwrap(), original);
    }

    #[tokio::test]
    async fn test_transcript_entries_in_arrival_order() {
        let model_frames = vec![
            r#"{"type":"conversation.item.input_audio_transcription.completed","item_id":"i1","transcript":"Hello"}"#.to_string(),
            r#"{"type":"response.audio_transcript.done","response_id":"r1","item_id":"i2","transcript":"Hi there"}"#.to_string(),
        ];
        let (telephony_tx, _telephony_rx) = mpsc::channel(16);
        let (model_tx, _model_rx) = mpsc::channel(16);

        let transcript = relay_streams(
            open_side(),
            telephony_tx,
            stream::iter(model_frames),
            model_tx,
        )
        .await;

        assert_eq!(transcript.join(), "user: Hello\nassistant: Hi there");
    }

    #[tokio::test]
    async fn test_inbound_close_cancels_model_pump_promptly() {
        // The model stream never ends on its own; closing the telephony
        // stream must still complete the relay within bounded time.
        let (telephony_tx, _telephony_rx) = mpsc::channel(16);
        let (model_tx, _model_rx) = mpsc::channel(16);

        let result = tokio::time::timeout(
            Duration::from_secs(1),
            relay_streams(
                stream::iter(vec![start_frame("MZ1")]),
                telephony_tx,
                open_side(),
                model_tx,
            ),
        )
        .await;

        assert!(result.is_ok(), "relay did not stop after inbound close");
    }

    #[tokio::test]
    async fn test_undecodable_telephony_frame_is_graceful_close() {
        let frames = vec![
            media_frame("AAEC"),
            "not json".to_string(),
            media_frame("AwQF"),
        ];
        let (telephony_tx, _telephony_rx) = mpsc::channel(16);
        let (model_tx, model_rx) = mpsc::channel(16);

        relay_streams(stream::iter(frames), telephony_tx, open_side(), model_tx).await;

        // Only the frame before the decode error was forwarded.
        let sent = drain(model_rx).await;
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_model_frame_ends_the_pump() {
        let model_frames = vec![
            r#"{"type":"conversation.item.input_audio_transcription.completed","item_id":"i1","transcript":"Hello"}"#.to_string(),
            "not json".to_string(),
            r#"{"type":"response.audio_transcript.done","response_id":"r1","item_id":"i2","transcript":"Hi there"}"#.to_string(),
        ];
        let (telephony_tx, _telephony_rx) = mpsc::channel(16);
        let (model_tx, _model_rx) = mpsc::channel(16);

        let transcript = relay_streams(
            open_side(),
            telephony_tx,
            stream::iter(model_frames),
            model_tx,
        )
        .await;

        // Only the entry before the bad frame made it in.
        assert_eq!(transcript.join(), "user: Hello");
    }

    #[tokio::test]
    async fn test_unknown_model_events_are_ignored() {
        let model_frames = vec![
            r#"{"type":"response.created","response":{"id":"r1"}}"#.to_string(),
            r#"{"type":"rate_limits.updated","rate_limits":[]}"#.to_string(),
        ];
        let (telephony_tx, telephony_rx) = mpsc::channel(16);
        let (model_tx, _model_rx) = mpsc::channel(16);

        let transcript = relay_streams(
            open_side(),
            telephony_tx,
            stream::iter(model_frames),
            model_tx,
        )
        .await;

        assert!(transcript.is_empty());
        assert!(drain(telephony_rx).await.is_empty());
    }
}
