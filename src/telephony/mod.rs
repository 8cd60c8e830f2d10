//! Telephony integration.
//!
//! Wire message types for the media stream WebSocket and the REST client
//! that places outbound calls.

pub mod initiator;
pub mod messages;

pub use initiator::{
    CallInitiationError, CallInitiator, TwilioCallInitiator, relay_endpoint_for,
};
pub use messages::{MediaPayload, OutboundMediaFrame, StartFrame, TelephonyEvent};
