//! Text completion backends used by code generation.

pub mod openai;

use async_trait::async_trait;

use crate::error::AppResult;

pub use openai::OpenAiClient;

/// A single system/user exchange with sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the text of the first generated choice.
    async fn complete(&self, request: CompletionRequest) -> AppResult<String>;
}
