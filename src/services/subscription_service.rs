use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Deserialize;

use super::Handler;
use crate::db::SubscriptionStore;
use crate::envelope::{CorsPolicy, HandlerRequest, HandlerResponse};
use crate::error::{AppError, AppResult};

pub const SUBSCRIPTION_CORS: CorsPolicy = CorsPolicy {
    allow_methods: "GET, POST, PUT, OPTIONS",
    allow_headers: "Content-Type, X-User-Id",
};

/// Length of a newly created subscription.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
struct CreateSubscriptionRequest {
    user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct UpdateSubscriptionRequest {
    user_id: Option<i32>,
    is_active: Option<bool>,
}

/// A zero id never refers to a serial row, so it counts as missing.
fn required_user_id(user_id: Option<i32>) -> AppResult<i32> {
    user_id
        .filter(|id| *id != 0)
        .ok_or_else(|| AppError::InvalidInput("user_id is required".to_string()))
}

pub struct SubscriptionServiceImpl {
    store: Arc<dyn SubscriptionStore>,
}

impl SubscriptionServiceImpl {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    async fn list(&self) -> AppResult<HandlerResponse> {
        let profiles = self.store.list_profiles().await?;
        tracing::debug!(count = profiles.len(), "Listed users");
        Ok(HandlerResponse::ok(&profiles))
    }

    #[tracing::instrument(name = "Create subscription request", skip(self, request))]
    async fn create(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let req: CreateSubscriptionRequest = request.json_body()?;
        let user_id = required_user_id(req.user_id)?;

        let expires_at = Utc::now() + Duration::days(SUBSCRIPTION_PERIOD_DAYS);
        let record = self.store.create_subscription(user_id, expires_at).await?;
        tracing::info!(user_id, subscription_id = record.id, "Subscription created");

        Ok(HandlerResponse::ok(&record))
    }

    #[tracing::instrument(name = "Update subscription request", skip(self, request))]
    async fn update(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        let req: UpdateSubscriptionRequest = request.json_body()?;
        let user_id = required_user_id(req.user_id)?;
        let is_active = req.is_active.unwrap_or(false);

        let record = self
            .store
            .set_current_active(user_id, is_active)
            .await?
            .ok_or_else(|| AppError::NotFound("Subscription not found".to_string()))?;
        tracing::info!(user_id, subscription_id = record.id, is_active, "Subscription updated");

        Ok(HandlerResponse::ok(&record))
    }
}

#[async_trait]
impl Handler for SubscriptionServiceImpl {
    fn cors(&self) -> CorsPolicy {
        SUBSCRIPTION_CORS
    }

    async fn dispatch(&self, request: &HandlerRequest) -> AppResult<HandlerResponse> {
        match request.http_method.as_str() {
            "GET" => self.list().await,
            "POST" => self.create(request).await,
            "PUT" => self.update(request).await,
            _ => Err(AppError::MethodNotAllowed),
        }
    }
}
