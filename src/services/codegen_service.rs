use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Handler;
use crate::completion::{CompletionClient, CompletionRequest};
use crate::envelope::{CorsPolicy, HandlerRequest, HandlerResponse};
use crate::error::{AppError, AppResult};

pub const CODEGEN_CORS: CorsPolicy = CorsPolicy {
    allow_methods: "POST, OPTIONS",
    allow_headers: "Content-Type",
};

pub const DEFAULT_LANGUAGE: &str = "python";
const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Deserialize)]
struct GenerateCodeRequest {
    prompt: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerateCodeResponse {
    code: String,
    language: String,
}

pub fn system_prompt(language: &str) -> String {
    format!(
        "You are an expert {} programmer. Generate clean, well-commented code based on the user's request. Return ONLY the code without explanations.",
        language.to_uppercase()
    )
}

pub struct CodeGenServiceImpl {
    /// `None` when no API credential is configured.
    client: Option<Arc<dyn CompletionClient>>,
}

impl CodeGenServiceImpl {
    pub fn new(client: Option<Arc<dyn CompletionClient>>) -> Self {
        Self { client }
    }

    #[tracing::instrument(name = "Generate code", skip(self, request))]
    async fn generate(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let req: GenerateCodeRequest = request.json_body()?;

        let prompt = req
            .prompt
            .filter(|prompt| !prompt.is_empty())
            .ok_or_else(|| AppError::InvalidInput("Prompt is required".to_string()))?;
        let language = req.language.unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        let client = self
            .client
            .as_ref()
            .ok_or_else(|| AppError::Config("OpenAI API key not configured".to_string()))?;

        let code = client
            .complete(CompletionRequest {
                system: system_prompt(&language),
                user: prompt,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            })
            .await?;
        tracing::info!(language = %language, code_len = code.len(), "Code generated");

        Ok(HandlerResponse::ok(&GenerateCodeResponse { code, language }))
    }
}

#[async_trait]
impl Handler for CodeGenServiceImpl {
    fn cors(&self) -> CorsPolicy {
        CODEGEN_CORS
    }

    async fn dispatch(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        match request.http_method.as_str() {
            "POST" => self.generate(request).await,
            _ => Err(AppError::MethodNotAllowed),
        }
    }
}
