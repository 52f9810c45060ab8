use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::store::{SubscriptionStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{SubscriptionRecord, SubscriptionStatus, UserProfile, UserRow, UserSubscriptionRow};

/// Reads cast `expires_at` to `timestamptz` and coalesce nullable columns, so both the
/// shipped migration and externally owned `TIMESTAMP`/nullable schemas decode.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    #[tracing::instrument(name = "Upsert user profile", skip(self, name))]
    async fn upsert_profile(&self, email: &str, name: &str) -> AppResult<UserProfile> {
        let mut tx = self.pool.begin().await?;

        let user: UserRow = sqlx::query_as(
            "INSERT INTO users (email, name) VALUES ($1, $2)
             ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
             RETURNING id, email, COALESCE(name, '') AS name, COALESCE(is_admin, FALSE) AS is_admin",
        )
        .bind(email)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        let subscription: Option<SubscriptionStatus> = sqlx::query_as(
            "SELECT COALESCE(is_active, FALSE) AS is_active, expires_at::timestamptz AS expires_at
             FROM subscriptions
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1",
        )
        .bind(user.id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(UserProfile::new(
            user,
            subscription.unwrap_or_else(SubscriptionStatus::inactive),
        ))
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    #[tracing::instrument(name = "List users with current subscription", skip(self))]
    async fn list_profiles(&self) -> AppResult<Vec<UserProfile>> {
        let rows: Vec<UserSubscriptionRow> = sqlx::query_as(
            "SELECT DISTINCT ON (u.id) u.id, u.email, COALESCE(u.name, '') AS name,
                    COALESCE(u.is_admin, FALSE) AS is_admin, s.is_active,
                    s.expires_at::timestamptz AS expires_at
             FROM users u
             LEFT JOIN subscriptions s ON u.id = s.user_id
             ORDER BY u.id, s.created_at DESC, s.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(UserProfile::from).collect())
    }

    #[tracing::instrument(name = "Create subscription", skip(self))]
    async fn create_subscription(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> AppResult<SubscriptionRecord> {
        sqlx::query_as(
            "INSERT INTO subscriptions (user_id, is_active, expires_at)
             VALUES ($1, TRUE, $2)
             RETURNING id, COALESCE(is_active, FALSE) AS is_active, expires_at::timestamptz AS expires_at",
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let unknown_user = matches!(
                &e,
                sqlx::Error::Database(db) if db.is_foreign_key_violation()
            );
            if unknown_user {
                AppError::NotFound("User not found".to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    #[tracing::instrument(name = "Set current subscription active flag", skip(self))]
    async fn set_current_active(
        &self,
        user_id: i32,
        is_active: bool,
    ) -> AppResult<Option<SubscriptionRecord>> {
        let record = sqlx::query_as(
            "UPDATE subscriptions
             SET is_active = $1, updated_at = CURRENT_TIMESTAMP
             WHERE id = (
                 SELECT id FROM subscriptions
                 WHERE user_id = $2
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1
             )
             RETURNING id, COALESCE(is_active, FALSE) AS is_active, expires_at::timestamptz AS expires_at",
        )
        .bind(is_active)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }
}
