//! Effects produced by state transitions

use crate::history::{SessionIdentity, Turn};

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Remember the identity for later submits
    SetIdentity { identity: Option<SessionIdentity> },

    /// Read stored history; produces `HistoryLoaded`
    LoadHistory,

    /// Swap the in-memory history for a freshly loaded one
    ReplaceHistory { turns: Vec<Turn> },

    /// Update the input buffer
    SetInput { text: String },

    /// Empty the input buffer
    ClearInput,

    /// Start the primary exchange; produces `ReplyReceived` or `ReplyFailed`
    RequestReply { prompt: String },

    /// Append one turn to the in-memory history
    AppendTurn { turn: Turn },

    /// Write the full in-memory history to the session store
    PersistHistory,

    /// Hand the turn to the background save queue
    ArchiveTurn {
        identity: SessionIdentity,
        turn: Turn,
    },
}

impl Effect {
    pub fn append_turn(turn: Turn) -> Self {
        Effect::AppendTurn { turn }
    }

    pub fn request_reply(prompt: impl Into<String>) -> Self {
        Effect::RequestReply {
            prompt: prompt.into(),
        }
    }
}
