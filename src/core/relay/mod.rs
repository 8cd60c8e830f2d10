//! Bidirectional relay between a telephony media socket and a model socket.
//!
//! The engine pumps caller audio to the model and model audio back to the
//! caller, accumulating a transcript from completion events as a side effect.
//! Whichever side closes first wins; the other pump is cancelled
//! cooperatively and the transcript collected so far is returned.

pub mod engine;
pub mod transcript;

pub use engine::relay_streams;
pub use transcript::{Speaker, TranscriptAccumulator, TranscriptEntry};

/// Summary substituted when the call produced no transcript entries.
pub const EMPTY_TRANSCRIPT_SUMMARY: &str = "No conversation content to summarize.";

/// Summary substituted when summarization fails.
pub const SUMMARY_FAILURE_FALLBACK: &str = "Sorry, I couldn't generate a summary.";

/// Result of a finished relay, ready for post-call processing.
#[derive(Debug)]
pub struct RelayOutcome {
    /// Transcript accumulated while the relay ran
    pub transcript: TranscriptAccumulator,
}

impl From<TranscriptAccumulator> for RelayOutcome {
    fn from(transcript: TranscriptAccumulator) -> Self {
        Self { transcript }
    }
}

impl RelayOutcome {
    /// Rendered transcript to summarize, or `None` when the call recorded
    /// no utterances and [`EMPTY_TRANSCRIPT_SUMMARY`] should be used.
    pub fn summary_input(&self) -> Option<String> {
        if self.transcript.is_empty() {
            None
        } else {
            Some(self.transcript.join())
        }
    }
}
