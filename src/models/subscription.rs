use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Subscription state as reported to clients.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SubscriptionStatus {
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SubscriptionStatus {
    /// State of a user that has never had a subscription.
    pub fn inactive() -> Self {
        Self {
            is_active: false,
            expires_at: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct SubscriptionRecord {
    pub id: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_inactive_serializes_null_expiry() {
        let value = serde_json::to_value(SubscriptionStatus::inactive()).unwrap();
        assert_eq!(value, serde_json::json!({"is_active": false, "expires_at": null}));
    }

    #[test]
    fn test_expiry_serializes_as_rfc3339() {
        let record = SubscriptionRecord {
            id: 7,
            is_active: true,
            expires_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()),
        };
        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value["expires_at"], "2024-03-01T12:00:00Z");
    }
}
