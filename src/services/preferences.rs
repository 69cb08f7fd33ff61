//! Per-user notification preferences.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::preferences::{UpdatePreferencesInput, UserPreferences};

const PREFERENCES_COLUMNS: &str =
    "id, user_id, email_notifications, in_app_notifications, notification_advance, created_at, updated_at";

/// Returns the user's stored preferences, or the defaults when none exist.
/// Reading never inserts a row.
pub async fn fetch(pool: &PgPool, user_id: Uuid) -> Result<UserPreferences, AppError> {
    let stored: Option<UserPreferences> = sqlx::query_as(&format!(
        "SELECT {} FROM user_preferences WHERE user_id = $1",
        PREFERENCES_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(stored.unwrap_or_else(|| UserPreferences::default_for(user_id)))
}

/// Creates or updates the user's single preferences row. Only supplied
/// fields change; unspecified ones keep their stored (or default) value.
pub async fn upsert(
    pool: &PgPool,
    user_id: Uuid,
    input: &UpdatePreferencesInput,
) -> Result<UserPreferences, AppError> {
    let current = fetch(pool, user_id).await?;

    let email_notifications = input.email_notifications.unwrap_or(current.email_notifications);
    let in_app_notifications = input.in_app_notifications.unwrap_or(current.in_app_notifications);
    let notification_advance = input.notification_advance.unwrap_or(current.notification_advance);

    let preferences: UserPreferences = sqlx::query_as(&format!(
        "INSERT INTO user_preferences (id, user_id, email_notifications, in_app_notifications, notification_advance)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (user_id) DO UPDATE
           SET email_notifications = EXCLUDED.email_notifications,
               in_app_notifications = EXCLUDED.in_app_notifications,
               notification_advance = EXCLUDED.notification_advance,
               updated_at = NOW()
         RETURNING {}",
        PREFERENCES_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(email_notifications)
    .bind(in_app_notifications)
    .bind(notification_advance)
    .fetch_one(pool)
    .await?;

    Ok(preferences)
}
