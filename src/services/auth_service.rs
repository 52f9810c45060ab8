use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::Handler;
use crate::db::UserStore;
use crate::envelope::{CorsPolicy, HandlerRequest, HandlerResponse};
use crate::error::{AppError, AppResult};

pub const AUTH_CORS: CorsPolicy = CorsPolicy {
    allow_methods: "POST, OPTIONS",
    allow_headers: "Content-Type",
};

/// Display name given to users who sign in without one.
pub const DEFAULT_DISPLAY_NAME: &str = "Пользователь";

#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: Option<String>,
    name: Option<String>,
}

pub struct AuthServiceImpl {
    store: Arc<dyn UserStore>,
}

impl AuthServiceImpl {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(name = "Sign in user", skip(self, request))]
    async fn sign_in(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let req: SignInRequest = request.json_body()?;

        let email = req
            .email
            .as_deref()
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("Email is required".to_string()))?;
        let name = req.name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME);

        let profile = self.store.upsert_profile(email, name).await?;
        tracing::info!(user_id = profile.id, is_admin = profile.is_admin, "User signed in");

        Ok(HandlerResponse::ok(&profile))
    }
}

#[async_trait]
impl Handler for AuthServiceImpl {
    fn cors(&self) -> CorsPolicy {
        AUTH_CORS
    }

    async fn dispatch(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        match request.http_method.as_str() {
            "POST" => self.sign_in(request).await,
            _ => Err(AppError::MethodNotAllowed),
        }
    }
}
