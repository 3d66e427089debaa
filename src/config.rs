//! Environment configuration

use crate::history::SessionIdentity;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the chat session binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend serving `/chat` and `/save-chat`
    pub base_url: String,
    /// Per-request deadline for the primary exchange; `None` waits forever
    pub reply_timeout: Option<Duration>,
    /// Sqlite file backing the session store; `None` keeps it in memory
    pub store_path: Option<PathBuf>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            reply_timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            store_path: None,
            email: None,
            nickname: None,
            log_json: false,
        }
    }
}

impl ChatConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let reply_timeout = match get("CHAT_TIMEOUT_SECS").map(|v| v.trim().parse::<u64>()) {
            Some(Ok(0)) => None,
            Some(Ok(secs)) => Some(Duration::from_secs(secs)),
            Some(Err(_)) => {
                tracing::warn!("Ignoring unparseable CHAT_TIMEOUT_SECS");
                defaults.reply_timeout
            }
            None => defaults.reply_timeout,
        };

        Self {
            base_url: get("CHAT_BASE_URL").unwrap_or(defaults.base_url),
            reply_timeout,
            store_path: get("CHAT_STORE_PATH").map(PathBuf::from),
            email: get("CHAT_EMAIL"),
            nickname: get("CHAT_NICKNAME"),
            log_json: get("CHAT_LOG_JSON").is_some(),
        }
    }

    /// Identity handed to the session; requires an email
    pub fn identity(&self) -> Option<SessionIdentity> {
        let identity = SessionIdentity::new(self.email.clone()?);
        Some(match &self.nickname {
            Some(nickname) => identity.with_nickname(nickname.clone()),
            None => identity,
        })
    }
}
