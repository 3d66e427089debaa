//! Events that can occur in a chat session

use crate::history::{SessionIdentity, Turn};
use chrono::{DateTime, Utc};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Profile events
    IdentityResolved {
        identity: Option<SessionIdentity>,
    },
    HistoryLoaded {
        turns: Vec<Turn>,
    },

    // User events
    InputChanged {
        text: String,
    },
    Submit {
        text: String,
    },

    // Backend events, stamped when the exchange settled
    ReplyReceived {
        text: Option<String>,
        at: DateTime<Utc>,
    },
    ReplyFailed {
        message: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::IdentityResolved { .. } => "identity_resolved",
            Event::HistoryLoaded { .. } => "history_loaded",
            Event::InputChanged { .. } => "input_changed",
            Event::Submit { .. } => "submit",
            Event::ReplyReceived { .. } => "reply_received",
            Event::ReplyFailed { .. } => "reply_failed",
        }
    }
}
