//! Chat session state types

use crate::history::SessionIdentity;
use serde::{Deserialize, Serialize};

/// Loading indicator state of a chat session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatState {
    /// No identity resolved yet, or nothing pending
    #[default]
    Idle,

    /// Identity known, stored history being read
    LoadingHistory,

    /// Primary exchange in flight for this (trimmed) input
    Sending { user_input: String },
}

impl ChatState {
    pub fn is_sending(&self) -> bool {
        matches!(self, ChatState::Sending { .. })
    }

    #[allow(dead_code)] // API completeness
    pub fn is_loading_history(&self) -> bool {
        matches!(self, ChatState::LoadingHistory)
    }

    /// Short name for logs and status lines
    pub fn name(&self) -> &'static str {
        match self {
            ChatState::Idle => "idle",
            ChatState::LoadingHistory => "loading_history",
            ChatState::Sending { .. } => "sending",
        }
    }
}

/// Session data the transition function reads but never owns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatContext {
    pub identity: Option<SessionIdentity>,
}

impl ChatContext {
    #[allow(dead_code)] // Used by tests that start from a known identity
    pub fn new(identity: Option<SessionIdentity>) -> Self {
        Self { identity }
    }
}
