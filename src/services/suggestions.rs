//! Priority suggestions.
//!
//! Suggestions are produced by a deterministic in-process heuristic (wording
//! signals plus due-date proximity) and recorded with a snapshot of the task
//! fields they were computed from, so the history stays meaningful after the
//! task changes or disappears. Accepting a suggestion that still points at a
//! live task applies the suggested priority to it.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::notification::NotificationType;
use crate::models::suggestion::{AiSuggestion, SuggestionRequest};
use crate::models::task::TaskPriority;
use crate::services::{notifications, tasks};

const SUGGESTION_COLUMNS: &str = "id, task_id, user_id, task_title, task_description, \
     task_due_date, suggested_priority, confidence, reasoning, was_accepted, created_at";

/// Wordings that mark a task as urgent on their own.
const HIGH_SIGNALS: &[&str] = &[
    "urgent", "asap", "critical", "blocker", "immediately", "emergency",
];

/// Wordings that nudge the priority upward.
const MEDIUM_SIGNALS: &[&str] = &["important", "soon", "deadline", "priority", "follow up"];

/// Produces, persists and returns a suggestion for the given request.
pub async fn suggest(
    pool: &PgPool,
    user_id: Uuid,
    request: &SuggestionRequest,
) -> Result<AiSuggestion, AppError> {
    // Snapshot either the named task or the ad-hoc fields.
    let (task_id, title, description, due_date) = match request.task_id {
        Some(task_id) => {
            let task = tasks::get_task(pool, task_id, user_id).await?;
            (Some(task.id), task.title, task.description, task.due_date)
        }
        None => {
            let title = request
                .title
                .as_ref()
                .ok_or_else(|| AppError::Validation("Either taskId or title is required".into()))?
                .clone();
            (None, title, request.description.clone(), request.due_date)
        }
    };

    let (priority, confidence, reasoning) =
        suggest_priority(&title, description.as_deref(), due_date, Utc::now());

    let suggestion: AiSuggestion = sqlx::query_as(&format!(
        "INSERT INTO ai_suggestions
             (id, task_id, user_id, task_title, task_description, task_due_date,
              suggested_priority, confidence, reasoning)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {}",
        SUGGESTION_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(task_id)
    .bind(user_id)
    .bind(&title)
    .bind(&description)
    .bind(due_date)
    .bind(priority)
    .bind(confidence)
    .bind(&reasoning)
    .fetch_one(pool)
    .await?;

    if let Err(e) = notifications::notify(
        pool,
        user_id,
        task_id,
        NotificationType::PrioritySuggested,
        "Priority suggested",
        &format!("\"{}\" looks like {} priority", title, priority.as_str()),
    )
    .await
    {
        log::warn!("failed to record suggestion notification: {}", e);
    }

    Ok(suggestion)
}

/// Lists the user's suggestions, newest first.
pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<AiSuggestion>, AppError> {
    let suggestions = sqlx::query_as::<_, AiSuggestion>(&format!(
        "SELECT {} FROM ai_suggestions WHERE user_id = $1 ORDER BY created_at DESC LIMIT 100",
        SUGGESTION_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(suggestions)
}

/// Accepts or rejects a suggestion. Accepting one that still points at a
/// live task applies the suggested priority to the task.
pub async fn resolve(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    accept: bool,
) -> Result<AiSuggestion, AppError> {
    let suggestion: Option<AiSuggestion> = sqlx::query_as(&format!(
        "UPDATE ai_suggestions SET was_accepted = $3
         WHERE id = $1 AND user_id = $2
         RETURNING {}",
        SUGGESTION_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .bind(accept)
    .fetch_optional(pool)
    .await?;

    let suggestion =
        suggestion.ok_or_else(|| AppError::NotFound("Suggestion not found".into()))?;

    if accept {
        if let Some(task_id) = suggestion.task_id {
            // The task may have been soft-deleted since the suggestion was
            // recorded; a vanished target is not an error here.
            let result = sqlx::query(
                "UPDATE tasks SET priority = $1, updated_at = NOW()
                 WHERE id = $2 AND user_id = $3 AND is_deleted = FALSE",
            )
            .bind(suggestion.suggested_priority)
            .bind(task_id)
            .bind(user_id)
            .execute(pool)
            .await?;

            if result.rows_affected() == 0 {
                log::debug!("accepted suggestion {} targets a vanished task", id);
            }
        }
    }

    Ok(suggestion)
}

/// The heuristic itself. Pure; `now` is passed in so tests can pin it.
///
/// Returns the suggested priority, a confidence in [0.0, 1.0] and a short
/// explanation of the signals that fired.
fn suggest_priority(
    title: &str,
    description: Option<&str>,
    due_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (TaskPriority, f64, String) {
    let text = match description {
        Some(description) => format!("{} {}", title, description).to_lowercase(),
        None => title.to_lowercase(),
    };

    let mut score = 0u32;
    let mut signals: Vec<String> = Vec::new();

    for keyword in HIGH_SIGNALS {
        if text.contains(keyword) {
            score += 4;
            signals.push(format!("wording mentions \"{}\"", keyword));
        }
    }
    for keyword in MEDIUM_SIGNALS {
        if text.contains(keyword) {
            score += 1;
            signals.push(format!("wording mentions \"{}\"", keyword));
        }
    }

    if let Some(due) = due_date {
        let remaining = due - now;
        if remaining < chrono::Duration::days(1) {
            score += 4;
            signals.push("due within a day or already past due".to_string());
        } else if remaining < chrono::Duration::days(3) {
            score += 2;
            signals.push("due within three days".to_string());
        } else if remaining < chrono::Duration::days(7) {
            score += 1;
            signals.push("due within a week".to_string());
        }
    }

    let priority = match score {
        0 => TaskPriority::NotDefined,
        1 => TaskPriority::Low,
        2..=3 => TaskPriority::Medium,
        _ => TaskPriority::High,
    };

    let confidence = (0.3 + 0.15 * signals.len() as f64).clamp(0.0, 1.0);

    let reasoning = if signals.is_empty() {
        "no scheduling or wording signals; leaving the priority unset".to_string()
    } else {
        signals.join("; ")
    };

    (priority, confidence, reasoning)
}
