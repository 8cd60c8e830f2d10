//! Transcript accumulation for one call.
//!
//! Entries are appended in the arrival order of completion events on the
//! model socket and never mutated or reordered. The accumulator has a single
//! writer (the model-to-telephony pump), so no locking is involved.

use std::fmt;

/// Who produced an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    /// The human caller
    User,
    /// The voice model
    Assistant,
}

impl Speaker {
    /// Label used when rendering transcript lines.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One completed utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    /// Speaker tag
    pub speaker: Speaker,
    /// Utterance text
    pub text: String,
}

/// Append-only, arrival-ordered transcript of a call.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    entries: Vec<TranscriptEntry>,
}

impl TranscriptAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a caller utterance.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker: Speaker::User,
            text: text.into(),
        });
    }

    /// Append an assistant utterance.
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.entries.push(TranscriptEntry {
            speaker: Speaker::Assistant,
            text: text.into(),
        });
    }

    /// Whether any utterance was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded utterances.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Recorded utterances in arrival order.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Render as `"<speaker>: <text>"` lines in arrival order.
    pub fn join(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.speaker, e.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
