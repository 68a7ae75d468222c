//! OpenAI client configuration with sensible defaults.

use crate::enrichment::{ChatModel, ChatRequest};
use crate::error::{FortellError, Result};
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Bounded retry count for transient (network-level) chat failures.
const TRANSIENT_RETRIES: u32 = 1;

/// Delay before retrying a transient failure.
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Create an OpenAI client with a custom timeout.
///
/// Every call through this client is bounded; a hung provider cannot hold a
/// request open past the timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}

/// Chat-completion provider backed by the OpenAI API.
pub struct OpenAiChat {
    client: Client<OpenAIConfig>,
}

impl OpenAiChat {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
        }
    }

    async fn try_complete(&self, request: &ChatRequest) -> std::result::Result<String, OpenAIError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt.clone())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_prompt.clone())
                .build()?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()?;

        let response = self.client.chat().create(chat_request).await?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        Ok(text)
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.try_complete(&request).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < TRANSIENT_RETRIES && is_transient(&e) => {
                    attempt += 1;
                    warn!("Transient chat failure ({e}), retry {attempt}/{TRANSIENT_RETRIES}");
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => {
                    return Err(FortellError::provider(
                        request.model.clone(),
                        format!("chat completion failed: {e}"),
                    ))
                }
            }
        }
    }
}

/// Network-level failures are worth one retry; API-level failures are not.
fn is_transient(error: &OpenAIError) -> bool {
    matches!(error, OpenAIError::Reqwest(_))
}
