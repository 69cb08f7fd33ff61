//! In-app notifications.
//!
//! There is no background scheduler: due-soon and overdue alerts are
//! synthesized when the user's notification list is read, at most one per
//! task and type. Everything else (completions, priority suggestions) is
//! recorded at the moment it happens via [`notify`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::notification::{Notification, NotificationType};
use crate::models::task::TaskStatus;
use crate::services::preferences;

const NOTIFICATION_COLUMNS: &str =
    "id, user_id, task_id, type, title, message, is_read, created_at";

/// Hard cap on a single listing; notifications are short-lived, not an
/// archive.
const LIST_LIMIT: i64 = 100;

/// Records a notification for the user, unless in-app notifications are
/// switched off in their preferences.
pub async fn notify(
    pool: &PgPool,
    user_id: Uuid,
    task_id: Option<Uuid>,
    kind: NotificationType,
    title: &str,
    message: &str,
) -> Result<(), AppError> {
    let prefs = preferences::fetch(pool, user_id).await?;
    if !prefs.in_app_notifications {
        return Ok(());
    }

    sqlx::query(
        "INSERT INTO notifications (id, user_id, task_id, type, title, message)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(task_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Lists the user's notifications, newest first, synthesizing any missing
/// due-date alerts beforehand.
pub async fn list(
    pool: &PgPool,
    user_id: Uuid,
    unread_only: bool,
) -> Result<Vec<Notification>, AppError> {
    sync_due_alerts(pool, user_id).await?;

    let sql = if unread_only {
        format!(
            "SELECT {} FROM notifications
             WHERE user_id = $1 AND is_read = FALSE
             ORDER BY created_at DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        )
    } else {
        format!(
            "SELECT {} FROM notifications
             WHERE user_id = $1
             ORDER BY created_at DESC LIMIT $2",
            NOTIFICATION_COLUMNS
        )
    };

    let notifications = sqlx::query_as::<_, Notification>(&sql)
        .bind(user_id)
        .bind(LIST_LIMIT)
        .fetch_all(pool)
        .await?;

    Ok(notifications)
}

/// Marks one notification as read. Scoped to the owner.
pub async fn mark_read(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Notification, AppError> {
    let notification: Option<Notification> = sqlx::query_as(&format!(
        "UPDATE notifications SET is_read = TRUE
         WHERE id = $1 AND user_id = $2
         RETURNING {}",
        NOTIFICATION_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    notification.ok_or_else(|| AppError::NotFound("Notification not found".into()))
}

/// Marks every unread notification of the user as read; returns how many
/// rows changed.
pub async fn mark_all_read(pool: &PgPool, user_id: Uuid) -> Result<u64, AppError> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Inserts missing `task_due_soon` and `task_overdue` alerts for the user's
/// open tasks. The advance window comes from the user's preferences; at most
/// one alert per task and type ever exists.
async fn sync_due_alerts(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    let prefs = preferences::fetch(pool, user_id).await?;
    if !prefs.in_app_notifications {
        return Ok(());
    }

    let now = Utc::now();
    let window_end = now + chrono::Duration::days(i64::from(prefs.notification_advance));

    let due_soon: Vec<(Uuid, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT t.id, t.title, t.due_date FROM tasks t
         WHERE t.user_id = $1 AND t.is_deleted = FALSE
           AND t.status <> $2 AND t.status <> $3
           AND t.due_date >= $4 AND t.due_date <= $5
           AND NOT EXISTS (
               SELECT 1 FROM notifications n
               WHERE n.task_id = t.id AND n.type = $6
           )",
    )
    .bind(user_id)
    .bind(TaskStatus::Completed)
    .bind(TaskStatus::Cancelled)
    .bind(now)
    .bind(window_end)
    .bind(NotificationType::TaskDueSoon)
    .fetch_all(pool)
    .await?;

    for (task_id, title, due_date) in due_soon {
        insert_alert(
            pool,
            user_id,
            task_id,
            NotificationType::TaskDueSoon,
            "Task due soon",
            &format!("\"{}\" is due on {}", title, due_date.format("%Y-%m-%d")),
        )
        .await?;
    }

    let overdue: Vec<(Uuid, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT t.id, t.title, t.due_date FROM tasks t
         WHERE t.user_id = $1 AND t.is_deleted = FALSE
           AND t.status <> $2 AND t.status <> $3
           AND t.due_date < $4
           AND NOT EXISTS (
               SELECT 1 FROM notifications n
               WHERE n.task_id = t.id AND n.type = $5
           )",
    )
    .bind(user_id)
    .bind(TaskStatus::Completed)
    .bind(TaskStatus::Cancelled)
    .bind(now)
    .bind(NotificationType::TaskOverdue)
    .fetch_all(pool)
    .await?;

    for (task_id, title, due_date) in overdue {
        insert_alert(
            pool,
            user_id,
            task_id,
            NotificationType::TaskOverdue,
            "Task overdue",
            &format!("\"{}\" was due on {}", title, due_date.format("%Y-%m-%d")),
        )
        .await?;
    }

    Ok(())
}

async fn insert_alert(
    pool: &PgPool,
    user_id: Uuid,
    task_id: Uuid,
    kind: NotificationType,
    title: &str,
    message: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO notifications (id, user_id, task_id, type, title, message)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(task_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}
