use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Per-user notification preferences. One row per user, cascade-deleted with
/// the owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email_notifications: bool,
    pub in_app_notifications: bool,
    /// How many days before the due date a due-soon alert fires.
    pub notification_advance: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserPreferences {
    /// The defaults a user gets before ever storing preferences.
    pub fn default_for(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            email_notifications: true,
            in_app_notifications: true,
            notification_advance: 2,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of preferences; only supplied fields change.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesInput {
    pub email_notifications: Option<bool>,
    pub in_app_notifications: Option<bool>,
    #[validate(range(min = 0, max = 30))]
    pub notification_advance: Option<i32>,
}
