//! Route configuration.
//!
//! # Endpoints
//!
//! - `GET /` - Liveness probe
//! - `POST /call_custom` - Initiate an outbound call
//! - `GET /media-stream/{session_id}` - WebSocket upgrade for the dialed
//!   call's media stream

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{call_handler, health_handler, media_stream_handler};
use crate::state::AppState;

/// Create the application router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_handler))
        .route("/call_custom", post(call_handler))
        .route("/media-stream/{session_id}", get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
