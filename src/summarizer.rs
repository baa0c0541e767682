//! Remote conversation summarizer
//!
//! Sends a conversation to an OpenAI-compatible chat completions endpoint and
//! returns the first choice's text. There is no retry and no built-in
//! timeout; callers that want a deadline wrap the call themselves.

use crate::config::SummarizerConfig;
use crate::conversation::Conversation;
use crate::prompts::{generate_summary_prompt, CONNECTION_CHECK_MESSAGE, SYSTEM_INSTRUCTION};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failed summary request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    /// The API answered with a non-success status or an unusable body
    #[error("Summary API error ({status}): {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Upstream error message
        message: String,
    },

    /// The API could not be reached
    #[error("Summary API unreachable: {0}")]
    Network(String),
}

impl SummaryError {
    /// Upstream message without the classification prefix
    pub fn upstream_message(&self) -> &str {
        match self {
            SummaryError::Remote { message, .. } => message,
            SummaryError::Network(message) => message,
        }
    }
}

/// Turns a conversation into a short text summary
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `conversation` using `api_key` for authentication
    async fn summarize(
        &self,
        conversation: &Conversation,
        api_key: &str,
    ) -> std::result::Result<String, SummaryError>;
}

/// Request body for the chat completions endpoint
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Summarizer backed by a chat completions API
///
/// # Examples
///
/// ```no_run
/// use chatvault::config::SummarizerConfig;
/// use chatvault::summarizer::{ChatCompletionSummarizer, Summarizer};
/// # use chatvault::conversation::Conversation;
///
/// # async fn example(conversation: Conversation) {
/// let summarizer = ChatCompletionSummarizer::new(SummarizerConfig::default());
/// let summary = summarizer.summarize(&conversation, "api-key").await;
/// # }
/// ```
pub struct ChatCompletionSummarizer {
    client: Client,
    config: SummarizerConfig,
}

impl ChatCompletionSummarizer {
    /// Create a summarizer for the configured endpoint
    pub fn new(config: SummarizerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        )
    }

    async fn send(
        &self,
        request: &ChatRequest<'_>,
        api_key: &str,
    ) -> std::result::Result<ChatResponse, SummaryError> {
        tracing::debug!(
            "Sending summary request: model={}, {} messages",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Summary request failed: {}", e);
                SummaryError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            tracing::error!("Summary API returned error {}: {}", status, message);
            return Err(SummaryError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| {
            tracing::error!("Failed to parse summary response: {}", e);
            SummaryError::Remote {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            }
        })
    }

    /// Send a minimal request to check that the key and endpoint work
    ///
    /// # Errors
    ///
    /// Returns the classified failure of the request
    pub async fn check_connection(&self, api_key: &str) -> std::result::Result<(), SummaryError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage::new("user", CONNECTION_CHECK_MESSAGE)],
            temperature: None,
            max_tokens: Some(10),
        };
        self.send(&request, api_key).await?;
        Ok(())
    }
}

#[async_trait]
impl Summarizer for ChatCompletionSummarizer {
    async fn summarize(
        &self,
        conversation: &Conversation,
        api_key: &str,
    ) -> std::result::Result<String, SummaryError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage::new("system", SYSTEM_INSTRUCTION),
                ChatMessage::new("user", generate_summary_prompt(conversation)),
            ],
            temperature: Some(self.config.temperature),
            max_tokens: None,
        };

        let response = self.send(&request, api_key).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SummaryError::Remote {
                status: 200,
                message: "No choices in summary response".to_string(),
            })?;

        tracing::debug!("Summary received: {} chars", choice.message.content.len());
        Ok(choice.message.content)
    }
}
