//! Conversation history types and their session-store encoding

use crate::store::{SessionStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed store key holding the JSON-encoded history
pub const HISTORY_KEY: &str = "UserSession";

/// One exchanged unit: a user input and the assistant's answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub user_input: String,
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(
        user_input: impl Into<String>,
        response: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_input: user_input.into(),
            response: response.into(),
            timestamp,
        }
    }
}

/// Profile data supplied by the auth collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl SessionIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            nickname: None,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }
}

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Malformed history payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Decode a stored payload. A JSON `null` decodes to an empty history.
pub fn decode_history(bytes: &[u8]) -> Result<Vec<Turn>, HistoryError> {
    let turns: Option<Vec<Turn>> = serde_json::from_slice(bytes)?;
    Ok(turns.unwrap_or_default())
}

pub fn encode_history(turns: &[Turn]) -> Result<Vec<u8>, HistoryError> {
    Ok(serde_json::to_vec(turns)?)
}

/// Read the history for `identity`.
///
/// Never fails: a missing identity skips the store entirely, and a missing,
/// unreadable or malformed payload yields an empty history.
pub fn load_history<S: SessionStore + ?Sized>(
    store: &S,
    identity: Option<&SessionIdentity>,
) -> Vec<Turn> {
    let Some(identity) = identity else {
        return Vec::new();
    };

    tracing::debug!(email = %identity.email, "Loading chat history");

    let bytes = match store.get(HISTORY_KEY) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read chat history");
            return Vec::new();
        }
    };

    match decode_history(&bytes) {
        Ok(turns) => {
            tracing::info!(count = turns.len(), "Chat history restored");
            turns
        }
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable chat history");
            Vec::new()
        }
    }
}

/// Overwrite the stored history with the full in-memory sequence
pub fn persist_history<S: SessionStore + ?Sized>(
    store: &S,
    turns: &[Turn],
) -> Result<(), HistoryError> {
    let bytes = encode_history(turns)?;
    store.set(HISTORY_KEY, &bytes)?;
    Ok(())
}
