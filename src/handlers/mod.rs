//! HTTP and WebSocket handlers.

pub mod call;
pub mod media_stream;

pub use call::{CallRequest, CallResponse, call_handler, health_handler};
pub use media_stream::media_stream_handler;
