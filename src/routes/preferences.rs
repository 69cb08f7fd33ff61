use actix_web::{get, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser, error::AppError, models::UpdatePreferencesInput, services,
};

/// Returns the authenticated user's notification preferences; defaults are
/// served (not persisted) until the user stores something.
#[get("")]
pub async fn get_preferences(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let preferences = services::preferences::fetch(&pool, user.0.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "preferences": preferences })))
}

/// Creates or updates the user's preferences; only supplied fields change.
#[put("")]
pub async fn update_preferences(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    input: web::Json<UpdatePreferencesInput>,
) -> Result<impl Responder, AppError> {
    input.validate()?;

    let preferences = services::preferences::upsert(&pool, user.0.id, &input).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "preferences": preferences })))
}
