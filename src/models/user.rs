use serde::Serialize;
use sqlx::FromRow;

use super::SubscriptionStatus;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
}

/// A user together with the state of their current subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub subscription: SubscriptionStatus,
}

impl UserProfile {
    pub fn new(user: UserRow, subscription: SubscriptionStatus) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            is_admin: user.is_admin,
            subscription,
        }
    }
}

/// One row of `users LEFT JOIN subscriptions`; the subscription side may be absent.
#[derive(Debug, Clone, FromRow)]
pub struct UserSubscriptionRow {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub is_admin: bool,
    pub is_active: Option<bool>,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<UserSubscriptionRow> for UserProfile {
    fn from(row: UserSubscriptionRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            is_admin: row.is_admin,
            subscription: SubscriptionStatus {
                is_active: row.is_active.unwrap_or(false),
                expires_at: row.expires_at,
            },
        }
    }
}
