//! HTTP implementation of the chat backend

use super::types::{ChatReply, ErrorResponse, GenerateResponse, PromptRequest, SaveChatRequest};
use super::{BackendError, ChatService};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const CHAT_PATH: &str = "/chat";
const SAVE_CHAT_PATH: &str = "/save-chat";

/// Talks JSON over HTTP to the chat and save endpoints
pub struct HttpChatService {
    client: Client,
    chat_url: String,
    save_url: String,
}

impl HttpChatService {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::unknown(format!("Failed to create HTTP client: {e}")))?;

        let base = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            chat_url: format!("{base}{CHAT_PATH}"),
            save_url: format!("{base}{SAVE_CHAT_PATH}"),
        })
    }

    /// POST a JSON body and return the raw response text of a 2xx reply
    async fn post_json<B: Serialize + ?Sized + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<String, BackendError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::timeout(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    BackendError::network(format!("Connection failed: {e}"))
                } else {
                    BackendError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::timeout(format!("Response timeout: {e}"))
            } else {
                BackendError::network(format!("Failed to read response: {e}"))
            }
        })?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_status(status, &body))
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.to_string(), |resp| resp.error.message);

    match status.as_u16() {
        400 | 404 | 422 => BackendError::invalid_request(format!("Invalid request: {message}")),
        401 | 403 => BackendError::auth(format!("Authentication failed: {message}")),
        408 | 504 => BackendError::timeout(format!("Gateway timeout: {message}")),
        429 => BackendError::rate_limit(format!("Rate limit exceeded: {message}")),
        500..=599 => BackendError::server_error(format!("Server error: {message}")),
        _ => BackendError::unknown(format!("HTTP {status}: {message}")),
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn send_prompt(&self, request: &PromptRequest) -> Result<ChatReply, BackendError> {
        let body = self.post_json(&self.chat_url, request).await?;
        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::decode(format!("Failed to parse response: {e}")))?;
        Ok(parsed.into_reply())
    }

    async fn save_chat(&self, request: &SaveChatRequest<'_>) -> Result<(), BackendError> {
        // Response body is ignored beyond the status check
        self.post_json(&self.save_url, request).await.map(|_| ())
    }

    fn endpoint(&self) -> &str {
        &self.chat_url
    }
}
