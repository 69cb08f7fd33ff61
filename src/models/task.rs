use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum, whose labels are declared in
/// ascending order so `ORDER BY priority` ranks `HIGH` last.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    /// No priority assigned yet.
    #[sqlx(rename = "NOT_DEFINED")]
    NotDefined,
    /// Low priority.
    #[sqlx(rename = "LOW")]
    Low,
    /// Medium priority.
    #[sqlx(rename = "MEDIUM")]
    Medium,
    /// High priority.
    #[sqlx(rename = "HIGH")]
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::NotDefined => "NOT_DEFINED",
            TaskPriority::Low => "LOW",
            TaskPriority::Medium => "MEDIUM",
            TaskPriority::High => "HIGH",
        }
    }
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task is yet to be started.
    #[sqlx(rename = "PENDING")]
    Pending,
    /// Task is currently being worked on.
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    /// Task is done.
    #[sqlx(rename = "COMPLETED")]
    Completed,
    /// Task was abandoned.
    #[sqlx(rename = "CANCELLED")]
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Due dates may not lie in the past at the time a task is created or the
/// date is changed.
pub fn due_date_not_past(due_date: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *due_date < Utc::now() {
        return Err(ValidationError::new("due date must not be in the past"));
    }
    Ok(())
}

/// Input structure for creating a task.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    /// The title of the task, 3 to 100 characters.
    #[validate(length(min = 3, max = 100))]
    pub title: String,

    /// An optional description, at most 500 characters.
    #[validate(length(max = 500))]
    pub description: Option<String>,

    /// Defaults to `NOT_DEFINED` when omitted.
    pub priority: Option<TaskPriority>,

    /// Defaults to `PENDING` when omitted.
    pub status: Option<TaskStatus>,

    /// Optional due date; must not be in the past.
    #[validate(custom = "due_date_not_past")]
    pub due_date: Option<DateTime<Utc>>,
}

/// Input structure for partially updating a task. Only supplied fields are
/// changed; `description` and `dueDate` accept an explicit `null` to clear
/// the stored value (hence the double `Option`).
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    #[validate(length(min = 3, max = 100))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,

    pub priority: Option<TaskPriority>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTaskInput {
    /// True when no field was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
    }
}

// Distinguishes an absent field (outer None) from an explicit null
// (Some(None)).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    /// Identifier of the user who owns the task.
    pub user_id: Uuid,
    /// The title of the task.
    pub title: String,
    /// An optional description for the task.
    pub description: Option<String>,
    /// The priority of the task.
    pub priority: TaskPriority,
    /// The current status of the task.
    pub status: TaskStatus,
    /// Optional due date for the task.
    pub due_date: Option<DateTime<Utc>>,
    /// Logical-deletion flag; deleted tasks are excluded from default queries.
    pub is_deleted: bool,
    /// Timestamp of when the task was created.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last update to the task.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `Task` from `CreateTaskInput` and the owner's id,
    /// applying the documented defaults.
    pub fn new(input: CreateTaskInput, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            description: input.description,
            priority: input.priority.unwrap_or(TaskPriority::NotDefined),
            status: input.status.unwrap_or(TaskStatus::Pending),
            due_date: input.due_date,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sortable columns for task listings.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    CreatedAt,
    DueDate,
    Priority,
    Title,
}

impl SortBy {
    /// The whitelisted column name interpolated into ORDER BY. Everything
    /// else in the listing query is bound, never interpolated.
    pub fn column(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::DueDate => "due_date",
            SortBy::Priority => "priority",
            SortBy::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query parameters accepted by the task listing endpoint.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilters {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: u32,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring match over title and description.
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Listing defaults to live tasks; pass `isDeleted=true` to retrieve
    /// soft-deleted ones.
    pub is_deleted: Option<bool>,
}

impl Default for TaskFilters {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            status: None,
            priority: None,
            search: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            is_deleted: None,
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

/// Pagination block returned alongside every task listing.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i64 = i64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit_i64 - 1) / limit_i64,
        }
    }
}

/// One page of tasks plus its pagination block.
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub pagination: Pagination,
}

/// Aggregate counts over a user's non-deleted tasks.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Counts keyed by status name; statuses with no tasks are absent.
    pub by_status: HashMap<String, i64>,
    /// Counts keyed by priority name; priorities with no tasks are absent.
    pub by_priority: HashMap<String, i64>,
    /// Tasks due within the next 7 days (inclusive of now).
    pub due_soon: i64,
    /// Tasks whose due date is strictly before now, regardless of status.
    pub overdue: i64,
}
