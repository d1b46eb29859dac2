/*!
 * OpenAI chat completions client.
 *
 * Requests are sent in JSON response mode; the first choice's content is
 * validated against the translation result schema.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Provider, error_for_status};
use crate::errors::ProviderError;
use crate::translation::TranslationPromptBuilder;
use crate::translation::model::{GameContext, TranslationRequest, TranslationResult};

/// Default OpenAI API endpoint
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";

/// OpenAI client for interacting with the chat completions API
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// Optional organization header
    organization: Option<String>,
    /// API endpoint URL
    endpoint: String,
    /// Model used for every request
    model: String,
    /// Sampling temperature
    temperature: f32,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Response format selector
#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

/// Chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

/// Individual choice of a chat completion
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        organization: Option<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            organization: organization.filter(|o| !o.is_empty()),
            endpoint: endpoint.into(),
            model: model.into(),
            temperature,
        }
    }

    fn api_url(&self) -> String {
        let endpoint = if self.endpoint.is_empty() {
            DEFAULT_OPENAI_ENDPOINT
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/v1/chat/completions", endpoint)
    }

    /// Send a chat request and return the first choice's content
    async fn chat(&self, request: &ChatRequest) -> Result<String, ProviderError> {
        let mut builder = self.client.post(self.api_url()).bearer_auth(&self.api_key).json(request);
        if let Some(organization) = &self.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ProviderError::ConnectionError(e.to_string())
            } else {
                ProviderError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() != 429 {
                error!("OpenAI API error ({}): {}", status, body);
            }
            return Err(error_for_status(status.as_u16(), &headers, body));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::ParseError("OpenAI response has no content".to_string()))
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(
        &self,
        request: &TranslationRequest,
        context: Option<&GameContext>,
    ) -> Result<TranslationResult, ProviderError> {
        let prompt = TranslationPromptBuilder::new(request).with_game_context(context);

        let mut messages: Vec<ChatMessage> = prompt
            .system_messages()
            .into_iter()
            .map(|content| ChatMessage {
                role: "system".to_string(),
                content: Some(content),
            })
            .collect();
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: Some(prompt.user_message()),
        });

        let chat_request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: Some(self.temperature),
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
            max_tokens: None,
        };

        let content = self.chat(&chat_request).await?;
        debug!("OpenAI response for '{}': {}", request.key, content);

        TranslationResult::parse(&content, request).inspect_err(|e| {
            error!("Invalid response for '{}': {} (raw: {})", request.key, e, content);
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some("Hello".to_string()),
            }],
            temperature: None,
            response_format: None,
            max_tokens: Some(5),
        };
        self.chat(&request).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
