//! Twilio Media Streams WebSocket message types.
//!
//! Inbound frames are JSON text with an `event` discriminator. The relay
//! recognizes `start` (carries the stream SID) and `media` (carries base64
//! G.711 u-law audio); every other event is ignored.
//!
//! Outbound frames are `media` events tagged with the stream SID learned
//! from the `start` event.

use serde::{Deserialize, Serialize};

/// Inbound frames from the telephony media socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyEvent {
    /// Stream start; carries call metadata including the stream SID
    Start {
        /// Start frame payload
        start: StartFrame,
    },

    /// Audio frame from the caller
    Media {
        /// Base64 audio payload
        media: MediaPayload,
    },

    /// Any other event (`connected`, `stop`, `mark`, `dtmf`, ...); ignored
    #[serde(other)]
    Other,
}

/// Payload of a `start` event.
#[derive(Debug, Clone, Deserialize)]
pub struct StartFrame {
    /// Stream identifier used to tag outbound media frames
    #[serde(rename = "streamSid")]
    pub stream_sid: String,
}

/// Base64 audio payload of a `media` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPayload {
    /// Base64-encoded G.711 u-law audio
    pub payload: String,
}

/// Outbound `media` frame sent back to the telephony socket.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMediaFrame {
    /// Always `"media"`
    pub event: &'static str,
    /// Stream SID from the `start` event; `null` until one was observed
    #[serde(rename = "streamSid")]
    pub stream_sid: Option<String>,
    /// Base64 audio payload
    pub media: MediaPayload,
}

impl OutboundMediaFrame {
    /// Build a media frame for the given stream.
    pub fn new(stream_sid: Option<String>, payload: String) -> Self {
        Self {
            event: "media",
            stream_sid,
            media: MediaPayload { payload },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_event_parses_stream_sid() {
        let json = r#"{"event":"start","sequenceNumber":"1","start":{"streamSid":"MZ123","accountSid":"AC1","callSid":"CA1"}}"#;
        match serde_json::from_str::<TelephonyEvent>(json).unwrap() {
            TelephonyEvent::Start { start } => assert_eq!(start.stream_sid, "MZ123"),
            _ => panic!("Expected start event"),
        }
    }

    #[test]
    fn test_media_event_parses_payload() {
        let json = r#"{"event":"media","media":{"track":"inbound","chunk":"2","payload":"AAEC"}}"#;
        match serde_json::from_str::<TelephonyEvent>(json).unwrap() {
            TelephonyEvent::Media { media } => assert_eq!(media.payload, "AAEC"),
            _ => panic!("Expected media event"),
        }
    }

    #[test]
    fn test_unrecognized_events_are_ignored() {
        for json in [
            r#"{"event":"connected","protocol":"Call"}"#,
            r#"{"event":"stop","stop":{"callSid":"CA1"}}"#,
            r#"{"event":"mark","mark":{"name":"m1"}}"#,
        ] {
            assert!(matches!(
                serde_json::from_str::<TelephonyEvent>(json).unwrap(),
                TelephonyEvent::Other
            ));
        }
    }

    #[test]
    fn test_outbound_media_frame_shape() {
        let frame = OutboundMediaFrame::new(Some("MZ123".to_string()), "AAEC".to_string());
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains(r#""event":"media""#));
        assert!(json.contains(r#""streamSid":"MZ123""#));
        assert!(json.contains(r#""payload":"AAEC""#));
    }

    #[test]
    fn test_outbound_media_frame_without_stream_sid() {
        let frame = OutboundMediaFrame::new(None, "AAEC".to_string());
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains(r#""streamSid":null"#));
    }
}
