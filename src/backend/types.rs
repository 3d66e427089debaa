//! Wire types for the chat and save endpoints

use crate::history::Turn;
use serde::{Deserialize, Serialize};

/// Body of the primary exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }
}

/// Wrap user input in the single-turn transcript the backend expects
pub fn format_prompt(user_input: &str) -> String {
    format!("User: {user_input}\nAssistant:")
}

/// Text extracted from a successful exchange; `None` when the reply carried
/// no text at the expected path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub text: Option<String>,
}

impl ChatReply {
    #[allow(dead_code)] // API completeness
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    #[allow(dead_code)] // API completeness
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Body of the best-effort remote save
#[derive(Debug, Serialize)]
pub struct SaveChatRequest<'a> {
    pub email: &'a str,
    pub chat: &'a Turn,
}

// Backend reply types (generateContent shape). Every level is optional so a
// partial reply decodes and simply yields no text.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`, ignoring empty strings
    pub(crate) fn into_reply(self) -> ChatReply {
        let text = self
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts)
            .and_then(|p| p.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty());
        ChatReply { text }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
