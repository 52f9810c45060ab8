//! In-process store used by handler tests. Mirrors the SQL semantics of `PgStore`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::store::{SubscriptionStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{SubscriptionRecord, SubscriptionStatus, UserProfile, UserRow};

#[derive(Debug, Clone)]
pub struct StoredSubscription {
    pub id: i32,
    pub user_id: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredSubscription {
    fn record(&self) -> SubscriptionRecord {
        SubscriptionRecord {
            id: self.id,
            is_active: self.is_active,
            expires_at: self.expires_at,
        }
    }

    fn status(&self) -> SubscriptionStatus {
        SubscriptionStatus {
            is_active: self.is_active,
            expires_at: self.expires_at,
        }
    }
}

#[derive(Default)]
struct State {
    users: Vec<UserRow>,
    subscriptions: Vec<StoredSubscription>,
}

impl State {
    fn current(&self, user_id: i32) -> Option<&StoredSubscription> {
        self.subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| (s.created_at, s.id))
    }

    fn next_subscription_id(&self) -> i32 {
        self.subscriptions.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later call fail the way an unreachable database does.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn insert_user(&self, email: &str, name: &str, is_admin: bool) -> i32 {
        let mut state = self.state.lock().unwrap();
        let id = state.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        state.users.push(UserRow {
            id,
            email: email.to_string(),
            name: name.to_string(),
            is_admin,
        });
        id
    }

    pub fn insert_subscription_at(
        &self,
        user_id: i32,
        is_active: bool,
        expires_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> i32 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_subscription_id();
        state.subscriptions.push(StoredSubscription {
            id,
            user_id,
            is_active,
            expires_at,
            created_at,
            updated_at: created_at,
        });
        id
    }

    pub fn users(&self) -> Vec<UserRow> {
        self.state.lock().unwrap().users.clone()
    }

    pub fn subscriptions(&self) -> Vec<StoredSubscription> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_profile(&self, email: &str, name: &str) -> AppResult<UserProfile> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap();

        let user = match state.users.iter().position(|u| u.email == email) {
            Some(index) => {
                let user = &mut state.users[index];
                user.name = name.to_string();
                user.clone()
            }
            None => {
                let id = state.users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
                let user = UserRow {
                    id,
                    email: email.to_string(),
                    name: name.to_string(),
                    is_admin: false,
                };
                state.users.push(user.clone());
                user
            }
        };

        let subscription = state
            .current(user.id)
            .map(StoredSubscription::status)
            .unwrap_or_else(SubscriptionStatus::inactive);

        Ok(UserProfile::new(user, subscription))
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn list_profiles(&self) -> AppResult<Vec<UserProfile>> {
        self.check_available()?;
        let state = self.state.lock().unwrap();

        let mut users = state.users.clone();
        users.sort_by_key(|u| u.id);

        Ok(users
            .into_iter()
            .map(|user| {
                let subscription = state
                    .current(user.id)
                    .map(StoredSubscription::status)
                    .unwrap_or_else(SubscriptionStatus::inactive);
                UserProfile::new(user, subscription)
            })
            .collect())
    }

    async fn create_subscription(
        &self,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> AppResult<SubscriptionRecord> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap();

        if !state.users.iter().any(|u| u.id == user_id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let now = Utc::now();
        let subscription = StoredSubscription {
            id: state.next_subscription_id(),
            user_id,
            is_active: true,
            expires_at: Some(expires_at),
            created_at: now,
            updated_at: now,
        };
        let record = subscription.record();
        state.subscriptions.push(subscription);
        Ok(record)
    }

    async fn set_current_active(
        &self,
        user_id: i32,
        is_active: bool,
    ) -> AppResult<Option<SubscriptionRecord>> {
        self.check_available()?;
        let mut state = self.state.lock().unwrap();

        let current_id = match state.current(user_id) {
            Some(subscription) => subscription.id,
            None => return Ok(None),
        };

        let subscription = state
            .subscriptions
            .iter_mut()
            .find(|s| s.id == current_id)
            .ok_or_else(|| AppError::Internal("subscription vanished".to_string()))?;
        subscription.is_active = is_active;
        subscription.updated_at = Utc::now();
        Ok(Some(subscription.record()))
    }
}
