use actix_web::{get, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{auth::AuthenticatedUser, error::AppError, models::NotificationQuery, services};

/// Lists the authenticated user's notifications, newest first. Due-date
/// alerts are synthesized on read; pass `unreadOnly=true` to filter.
#[get("")]
pub async fn list_notifications(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    query: web::Query<NotificationQuery>,
) -> Result<impl Responder, AppError> {
    let notifications =
        services::notifications::list(&pool, user.0.id, query.unread_only).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "notifications": notifications })))
}

/// Marks every unread notification as read.
#[put("/read-all")]
pub async fn mark_all_read(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let updated = services::notifications::mark_all_read(&pool, user.0.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": updated })))
}

/// Marks a single notification as read.
#[put("/{id}/read")]
pub async fn mark_read(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    notification_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let notification =
        services::notifications::mark_read(&pool, notification_id.into_inner(), user.0.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "notification": notification })))
}
