pub mod auth_service;
pub mod codegen_service;
pub mod subscription_service;

use async_trait::async_trait;

use crate::envelope::{CorsPolicy, HandlerRequest, HandlerResponse};
use crate::error::AppResult;

pub use auth_service::AuthServiceImpl;
pub use codegen_service::CodeGenServiceImpl;
pub use subscription_service::SubscriptionServiceImpl;

/// One endpoint. Answers CORS preflight itself and maps errors to envelopes.
#[async_trait]
pub trait Handler: Send + Sync {
    fn cors(&self) -> CorsPolicy;

    /// Handles every method except OPTIONS.
    async fn dispatch(&self, request: &HandlerRequest) -> AppResult<HandlerResponse>;

    async fn handle(&self, request: HandlerRequest) -> HandlerResponse {
        if request.http_method == "OPTIONS" {
            return HandlerResponse::preflight(&self.cors());
        }

        match self.dispatch(&request).await {
            Ok(response) => response,
            Err(err) => err.into(),
        }
    }
}
