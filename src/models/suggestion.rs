use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::task::TaskPriority;

/// A recorded priority suggestion.
///
/// Carries a snapshot of the task's title/description/due date at suggestion
/// time, so the suggestion history stays meaningful after the task is edited
/// or deleted (`task_id` goes NULL on task removal, the snapshot stays).
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AiSuggestion {
    pub id: Uuid,
    /// Link to the task, if it still exists.
    pub task_id: Option<Uuid>,
    pub user_id: Uuid,
    pub task_title: String,
    pub task_description: Option<String>,
    pub task_due_date: Option<DateTime<Utc>>,
    pub suggested_priority: TaskPriority,
    /// Engine confidence in [0.0, 1.0], when available.
    pub confidence: Option<f64>,
    /// Human-readable explanation of the suggestion.
    pub reasoning: Option<String>,
    /// Tri-state acceptance: `None` while pending, then accepted or rejected.
    pub was_accepted: Option<bool>,
    pub created_at: DateTime<Utc>,
}

/// Request body for producing a suggestion. Either `taskId` names an owned
/// task (the snapshot is taken from the store) or the caller supplies an
/// ad-hoc `title` with optional description and due date.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub task_id: Option<Uuid>,
    #[validate(length(min = 3, max = 100))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Request body for resolving a suggestion.
#[derive(Debug, Deserialize)]
pub struct ResolveSuggestionRequest {
    pub accept: bool,
}
