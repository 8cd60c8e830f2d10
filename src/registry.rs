//! In-memory registry of pending call sessions.
//!
//! A session is registered when a call is initiated and claimed exactly once
//! when the telephony media socket attaches. Claiming removes the entry, so
//! a session id can never be attached twice and abandoned sessions do not
//! accumulate observable state beyond the map entry itself.

use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::realtime::Voice;

/// Per-call settings captured at initiation time.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// System instructions for the voice model
    pub instructions: String,
    /// Voice the model speaks with
    pub voice: Voice,
    /// Recipient for the post-call summary email, when configured
    pub notify_email: Option<String>,
}

/// Registry of sessions awaiting their media stream.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionSettings>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session and return its generated id.
    pub fn create(&self, settings: SessionSettings) -> String {
        let session_id = Uuid::new_v4().simple().to_string();
        self.sessions
            .lock()
            .insert(session_id.clone(), settings);
        session_id
    }

    /// Claim a session, removing it from the registry.
    ///
    /// Returns `None` for unknown ids and for ids that were already claimed.
    pub fn take(&self, session_id: &str) -> Option<SessionSettings> {
        self.sessions.lock().remove(session_id)
    }

    /// Number of sessions awaiting attachment.
    pub fn pending(&self) -> usize {
        self.sessions.lock().len()
    }
}
