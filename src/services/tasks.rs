//! Task CRUD, filtered/paginated listing and aggregate statistics, always
//! scoped to the owning user.
//!
//! Ownership checks are folded into the query predicates (`id AND user_id`,
//! plus `is_deleted = FALSE` where deleted rows are out of scope) rather than
//! performed as a separate fetch-then-check step, so there is no window for a
//! concurrent modification between check and use.

use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::notification::NotificationType;
use crate::models::task::{
    CreateTaskInput, Pagination, Task, TaskFilters, TaskPage, TaskPriority, TaskStats,
    TaskStatus, UpdateTaskInput,
};
use crate::services::notifications;

const TASK_COLUMNS: &str =
    "id, user_id, title, description, priority, status, due_date, is_deleted, created_at, updated_at";

const TASK_NOT_FOUND: &str = "Task not found";

/// How far ahead `dueSoon` looks.
const DUE_SOON_WINDOW_DAYS: i64 = 7;

/// Persists a new task for the user, applying the documented defaults.
pub async fn create_task(
    pool: &PgPool,
    user_id: Uuid,
    input: CreateTaskInput,
) -> Result<Task, AppError> {
    let task = Task::new(input, user_id);

    let task: Task = sqlx::query_as(&format!(
        "INSERT INTO tasks (id, user_id, title, description, priority, status, due_date)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING {}",
        TASK_COLUMNS
    ))
    .bind(task.id)
    .bind(task.user_id)
    .bind(task.title)
    .bind(task.description)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.due_date)
    .fetch_one(pool)
    .await?;

    Ok(task)
}

/// Lists the user's tasks with filtering, sorting and pagination.
///
/// The WHERE clause is assembled from numbered placeholders and every value
/// is bound; the only interpolated fragments are the whitelisted sort column
/// and direction. Requesting a page past the end yields an empty page, not
/// an error.
pub async fn list_tasks(
    pool: &PgPool,
    user_id: Uuid,
    filters: &TaskFilters,
) -> Result<TaskPage, AppError> {
    let mut clause = String::from("WHERE user_id = $1 AND is_deleted = $2");
    let mut param_count = 3;

    if filters.status.is_some() {
        clause.push_str(&format!(" AND status = ${}", param_count));
        param_count += 1;
    }
    if filters.priority.is_some() {
        clause.push_str(&format!(" AND priority = ${}", param_count));
        param_count += 1;
    }
    if filters.search.is_some() {
        clause.push_str(&format!(
            " AND (title ILIKE ${} OR description ILIKE ${})",
            param_count,
            param_count + 1
        ));
        param_count += 2;
    }

    let include_deleted = filters.is_deleted.unwrap_or(false);
    let search_pattern = filters.search.as_ref().map(|s| format!("%{}%", s));

    let count_sql = format!("SELECT COUNT(*) FROM tasks {}", clause);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(user_id)
        .bind(include_deleted);
    if let Some(status) = filters.status {
        count_query = count_query.bind(status);
    }
    if let Some(priority) = filters.priority {
        count_query = count_query.bind(priority);
    }
    if let Some(pattern) = &search_pattern {
        count_query = count_query.bind(pattern).bind(pattern);
    }
    let total = count_query.fetch_one(pool).await?;

    let page_sql = format!(
        "SELECT {} FROM tasks {} ORDER BY {} {} LIMIT ${} OFFSET ${}",
        TASK_COLUMNS,
        clause,
        filters.sort_by.column(),
        filters.sort_order.sql(),
        param_count,
        param_count + 1
    );
    let mut page_query = sqlx::query_as::<_, Task>(&page_sql)
        .bind(user_id)
        .bind(include_deleted);
    if let Some(status) = filters.status {
        page_query = page_query.bind(status);
    }
    if let Some(priority) = filters.priority {
        page_query = page_query.bind(priority);
    }
    if let Some(pattern) = &search_pattern {
        page_query = page_query.bind(pattern).bind(pattern);
    }
    let offset = i64::from(filters.page - 1) * i64::from(filters.limit);
    let tasks = page_query
        .bind(i64::from(filters.limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok(TaskPage {
        tasks,
        pagination: Pagination::new(filters.page, filters.limit, total),
    })
}

/// Fetches a single live task owned by the user.
///
/// Absent, soft-deleted and foreign-owned tasks are indistinguishable: all
/// three produce the same `NotFound`.
pub async fn get_task(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Task, AppError> {
    let task: Option<Task> = sqlx::query_as(&format!(
        "SELECT {} FROM tasks WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE",
        TASK_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    task.ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))
}

/// Applies a partial update to a task. Only supplied fields change; an
/// explicit null clears `description` or `due_date`.
pub async fn update_task(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    input: UpdateTaskInput,
) -> Result<Task, AppError> {
    if input.is_empty() {
        // Nothing to change; still subject to the ownership predicate.
        return get_task(pool, id, user_id).await;
    }

    if let Some(Some(due_date)) = input.due_date {
        if due_date < Utc::now() {
            return Err(AppError::Validation("Due date must not be in the past".into()));
        }
    }

    let mut sets = vec!["updated_at = NOW()".to_string()];
    let mut param_count = 1;

    if input.title.is_some() {
        sets.push(format!("title = ${}", param_count));
        param_count += 1;
    }
    if input.description.is_some() {
        sets.push(format!("description = ${}", param_count));
        param_count += 1;
    }
    if input.priority.is_some() {
        sets.push(format!("priority = ${}", param_count));
        param_count += 1;
    }
    if input.status.is_some() {
        sets.push(format!("status = ${}", param_count));
        param_count += 1;
    }
    if input.due_date.is_some() {
        sets.push(format!("due_date = ${}", param_count));
        param_count += 1;
    }

    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ${} AND user_id = ${} AND is_deleted = FALSE RETURNING {}",
        sets.join(", "),
        param_count,
        param_count + 1,
        TASK_COLUMNS
    );

    let mut query = sqlx::query_as::<_, Task>(&sql);
    if let Some(title) = &input.title {
        query = query.bind(title);
    }
    if let Some(description) = &input.description {
        query = query.bind(description.as_deref());
    }
    if let Some(priority) = input.priority {
        query = query.bind(priority);
    }
    if let Some(status) = input.status {
        query = query.bind(status);
    }
    if let Some(due_date) = input.due_date {
        query = query.bind(due_date);
    }

    let task: Option<Task> = query.bind(id).bind(user_id).fetch_optional(pool).await?;
    let task = task.ok_or_else(|| AppError::NotFound(TASK_NOT_FOUND.into()))?;

    if input.status == Some(TaskStatus::Completed) {
        // A failed notification must not undo a successful update.
        if let Err(e) = notifications::notify(
            pool,
            user_id,
            Some(task.id),
            NotificationType::TaskCompleted,
            "Task completed",
            &format!("\"{}\" was marked as completed", task.title),
        )
        .await
        {
            log::warn!("failed to record completion notification: {}", e);
        }
    }

    Ok(task)
}

/// Soft-deletes a task: sets `is_deleted` and leaves the row in place.
/// Physical deletion is not exposed anywhere.
pub async fn delete_task(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE tasks SET is_deleted = TRUE, updated_at = NOW()
         WHERE id = $1 AND user_id = $2 AND is_deleted = FALSE",
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(TASK_NOT_FOUND.into()));
    }

    Ok(())
}

/// Aggregates counts by status and priority over the user's live tasks, plus
/// due-soon and overdue counts relative to now.
pub async fn task_stats(pool: &PgPool, user_id: Uuid) -> Result<TaskStats, AppError> {
    let now = Utc::now();

    let status_rows: Vec<(TaskStatus, i64)> = sqlx::query_as(
        "SELECT status, COUNT(*) FROM tasks
         WHERE user_id = $1 AND is_deleted = FALSE GROUP BY status",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let priority_rows: Vec<(TaskPriority, i64)> = sqlx::query_as(
        "SELECT priority, COUNT(*) FROM tasks
         WHERE user_id = $1 AND is_deleted = FALSE GROUP BY priority",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let due_soon: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks
         WHERE user_id = $1 AND is_deleted = FALSE
           AND due_date >= $2 AND due_date <= $3",
    )
    .bind(user_id)
    .bind(now)
    .bind(now + chrono::Duration::days(DUE_SOON_WINDOW_DAYS))
    .fetch_one(pool)
    .await?;

    // Strictly before now, independent of status.
    let overdue: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks
         WHERE user_id = $1 AND is_deleted = FALSE AND due_date < $2",
    )
    .bind(user_id)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(TaskStats {
        by_status: status_rows
            .into_iter()
            .map(|(status, count)| (status.as_str().to_string(), count))
            .collect::<HashMap<_, _>>(),
        by_priority: priority_rows
            .into_iter()
            .map(|(priority, count)| (priority.as_str().to_string(), count))
            .collect::<HashMap<_, _>>(),
        due_soon,
        overdue,
    })
}
