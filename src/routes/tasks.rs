use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskInput, TaskFilters, UpdateTaskInput},
    services,
};

/// Creates a new task for the authenticated user.
///
/// Priority defaults to `NOT_DEFINED` and status to `PENDING` when omitted.
#[post("")]
pub async fn create_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_data: web::Json<CreateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = services::tasks::create_task(&pool, user.0.id, task_data.into_inner()).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "task": task })))
}

/// Lists the authenticated user's tasks.
///
/// Supports `page`, `limit`, `status`, `priority`, `search` (case-insensitive
/// over title and description), `sortBy`, `sortOrder`, and `isDeleted` to
/// retrieve soft-deleted tasks instead of live ones.
#[get("")]
pub async fn list_tasks(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    filters: web::Query<TaskFilters>,
) -> Result<impl Responder, AppError> {
    filters.validate()?;

    let page = services::tasks::list_tasks(&pool, user.0.id, &filters).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Aggregate statistics over the authenticated user's live tasks.
#[get("/stats")]
pub async fn task_stats(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let stats = services::tasks::task_stats(&pool, user.0.id).await?;

    Ok(HttpResponse::Ok().json(stats))
}

/// Retrieves a single task by id. Tasks that are absent, soft-deleted or
/// owned by someone else all yield the same 404.
#[get("/{id}")]
pub async fn get_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let task = services::tasks::get_task(&pool, task_id.into_inner(), user.0.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "task": task })))
}

/// Partially updates a task; only supplied fields change.
#[put("/{id}")]
pub async fn update_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = services::tasks::update_task(
        &pool,
        task_id.into_inner(),
        user.0.id,
        task_data.into_inner(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "task": task })))
}

/// Soft-deletes a task.
#[delete("/{id}")]
pub async fn delete_task(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    services::tasks::delete_task(&pool, task_id.into_inner(), user.0.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Task deleted"
    })))
}
