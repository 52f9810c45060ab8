use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::models::{SubscriptionRecord, UserProfile};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user or overwrites the name of the existing row with this email,
    /// then reads their current subscription.
    async fn upsert_profile(&self, email: &str, name: &str) -> AppResult<UserProfile>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Every user with their current subscription, ordered by user id.
    async fn list_profiles(&self) -> AppResult<Vec<UserProfile>>;

    /// Returns `NotFound` when the user does not exist.
    async fn create_subscription(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> AppResult<SubscriptionRecord>;

    /// Sets the active flag on the user's most recently created subscription.
    /// `None` when the user has no subscription rows.
    async fn set_current_active(
        &self,
        user_id: i32,
        is_active: bool,
    ) -> AppResult<Option<SubscriptionRecord>>;
}
