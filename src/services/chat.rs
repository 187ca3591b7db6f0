//! Relay for the website chat widget.
//!
//! Messages are forwarded to a workflow-automation webhook whose reply is
//! passed back verbatim.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MAX_MESSAGE_LENGTH: u64 = 2000;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[serde(default)]
    #[validate(length(max = 128))]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Forwarded<'a> {
    message: &'a str,
    session_id: &'a str,
    source: &'static str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatReply {
    #[serde(default)]
    pub reply: String,
}

#[derive(Clone)]
pub struct ChatRelay {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl ChatRelay {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub async fn send(&self, input: &ChatMessage) -> Result<ChatReply, AppError> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if input.message.trim().is_empty() {
            return Err(AppError::Validation("message must not be blank".to_string()));
        }

        let url = self
            .webhook_url
            .as_deref()
            .ok_or(AppError::NotConfigured("CHAT_WEBHOOK_URL"))?;
        let session_id = input
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let response = self
            .http
            .post(url)
            .json(&Forwarded {
                message: input.message.trim(),
                session_id: &session_id,
                source: "web",
            })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Chat webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Chat webhook HTTP {}",
                response.status()
            )));
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Chat webhook JSON parse error: {}", e)))?;
        tracing::debug!(session_id = %session_id, "Chat message relayed");
        Ok(reply)
    }

    /// Best-effort forward of an arbitrary event (call webhooks).
    pub async fn forward_event(&self, event: &serde_json::Value) {
        let Some(url) = self.webhook_url.as_deref() else {
            return;
        };
        if let Err(e) = self.http.post(url).json(event).send().await {
            tracing::warn!(error = %e, "Failed to forward call event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> ChatMessage {
        ChatMessage {
            message: text.to_string(),
            session_id: None,
        }
    }

    #[tokio::test]
    async fn test_rejects_blank_and_oversized_messages() {
        let relay = ChatRelay::new(Some("http://127.0.0.1:9/hook".to_string()));

        assert!(matches!(
            relay.send(&message("   ")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            relay.send(&message("")).await,
            Err(AppError::Validation(_))
        ));
        let long = "x".repeat(MAX_MESSAGE_LENGTH as usize + 1);
        assert!(matches!(
            relay.send(&message(&long)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_webhook() {
        let relay = ChatRelay::new(None);
        assert!(matches!(
            relay.send(&message("hola")).await,
            Err(AppError::NotConfigured(_))
        ));
    }
}
