//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::backend::{BackendError, ChatReply, ChatService, PromptRequest, SaveChatRequest};
use crate::history::{SessionIdentity, Turn};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for the primary exchange
#[async_trait]
pub trait ReplyClient: Send + Sync {
    /// Send a formatted prompt and return the extracted reply
    async fn complete(&self, prompt: &str) -> Result<ChatReply, BackendError>;
}

/// Sink for the best-effort remote save
#[async_trait]
pub trait TurnArchive: Send + Sync {
    async fn save_turn(&self, identity: &SessionIdentity, turn: &Turn) -> Result<(), BackendError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ReplyClient + ?Sized> ReplyClient for Arc<T> {
    async fn complete(&self, prompt: &str) -> Result<ChatReply, BackendError> {
        (**self).complete(prompt).await
    }
}

#[async_trait]
impl<T: TurnArchive + ?Sized> TurnArchive for Arc<T> {
    async fn save_turn(&self, identity: &SessionIdentity, turn: &Turn) -> Result<(), BackendError> {
        (**self).save_turn(identity, turn).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Adapter to use a `ChatService` for both the exchange and the remote save
#[derive(Clone)]
pub struct ServiceClient {
    service: Arc<dyn ChatService>,
}

impl ServiceClient {
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ReplyClient for ServiceClient {
    async fn complete(&self, prompt: &str) -> Result<ChatReply, BackendError> {
        self.service.send_prompt(&PromptRequest::new(prompt)).await
    }
}

#[async_trait]
impl TurnArchive for ServiceClient {
    async fn save_turn(&self, identity: &SessionIdentity, turn: &Turn) -> Result<(), BackendError> {
        self.service
            .save_chat(&SaveChatRequest {
                email: &identity.email,
                chat: turn,
            })
            .await
    }
}
