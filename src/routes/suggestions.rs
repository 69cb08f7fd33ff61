use actix_web::{get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{ResolveSuggestionRequest, SuggestionRequest},
    services,
};

/// Produces and records a priority suggestion, either for an owned task
/// (`taskId`) or for ad-hoc fields.
#[post("")]
pub async fn create_suggestion(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    request: web::Json<SuggestionRequest>,
) -> Result<impl Responder, AppError> {
    request.validate()?;

    let suggestion = services::suggestions::suggest(&pool, user.0.id, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({ "suggestion": suggestion })))
}

/// Lists the authenticated user's suggestions, newest first.
#[get("")]
pub async fn list_suggestions(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let suggestions = services::suggestions::list(&pool, user.0.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "suggestions": suggestions })))
}

/// Accepts or rejects a suggestion. Accepting applies the suggested priority
/// to the linked task when it still exists.
#[put("/{id}")]
pub async fn resolve_suggestion(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    suggestion_id: web::Path<Uuid>,
    request: web::Json<ResolveSuggestionRequest>,
) -> Result<impl Responder, AppError> {
    let suggestion = services::suggestions::resolve(
        &pool,
        suggestion_id.into_inner(),
        user.0.id,
        request.accept,
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "suggestion": suggestion })))
}
