//! OpenAI-compatible chat completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{CompletionClient, CompletionRequest};
use crate::error::{AppError, AppResult};
use crate::http_client::HttpClient;

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// system, user or assistant.
    pub role: String,
    /// Null for some tool-call replies.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatCompletionResponse {
    fn into_first_text(self) -> AppResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream("completion returned no content".to_string()))
    }
}

pub struct OpenAiClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        http: HttpClient,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn build_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: Some(request.system),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: Some(request.user),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    #[tracing::instrument(name = "Request chat completion", skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(request);

        let response: ChatCompletionResponse = self
            .http
            .post_json_bearer(&url, &self.api_key, &body)
            .await?;

        response.into_first_text()
    }
}
