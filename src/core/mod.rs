pub mod realtime;
pub mod relay;

// Re-export commonly used types for convenience
pub use realtime::{
    ClientEvent, ModelSocket, RealtimeError, RealtimeModel, RealtimeResult, ServerEvent, Voice,
};

pub use relay::{RelayOutcome, Speaker, TranscriptAccumulator, TranscriptEntry, relay_streams};
