//! Chat backend abstraction
//!
//! The primary exchange (prompt in, generated text out) and the best-effort
//! remote save of a completed turn.

mod error;
mod http;
mod types;

pub use error::{BackendError, BackendErrorKind};
pub use http::HttpChatService;
pub use types::{format_prompt, ChatReply, PromptRequest, SaveChatRequest};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for chat backends
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send a prompt and extract the reply text
    async fn send_prompt(&self, request: &PromptRequest) -> Result<ChatReply, BackendError>;

    /// Store a completed turn remotely
    async fn save_chat(&self, request: &SaveChatRequest<'_>) -> Result<(), BackendError>;

    /// Where prompts go, for logging
    fn endpoint(&self) -> &str;
}

/// Logging wrapper for chat services
pub struct LoggingService {
    inner: Arc<dyn ChatService>,
    endpoint: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn ChatService>) -> Self {
        let endpoint = inner.endpoint().to_string();
        Self { inner, endpoint }
    }
}

#[async_trait]
impl ChatService for LoggingService {
    async fn send_prompt(&self, request: &PromptRequest) -> Result<ChatReply, BackendError> {
        let start = std::time::Instant::now();
        let result = self.inner.send_prompt(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    has_text = reply.text.is_some(),
                    "Chat request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    endpoint = %self.endpoint,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = %e.kind,
                    "Chat request failed"
                );
            }
        }

        result
    }

    async fn save_chat(&self, request: &SaveChatRequest<'_>) -> Result<(), BackendError> {
        let start = std::time::Instant::now();
        let result = self.inner.save_chat(request).await;

        if result.is_ok() {
            tracing::info!(
                email = %request.email,
                duration_ms = %start.elapsed().as_millis(),
                "Chat saved"
            );
        }

        result
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
