//! Registration, login and user lookup.
//!
//! Login failures for an unknown email and for a wrong password produce the
//! same error value, so the response cannot be used to enumerate accounts.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::TokenService;
use crate::auth::{LoginRequest, RegisterRequest};
use crate::error::AppError;
use crate::models::user::{PublicUser, User};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registers a new user and issues a token for it.
///
/// Fails with `Conflict` when the email is already taken. The email is
/// trimmed and lowercased before both the uniqueness check and the insert.
pub async fn register(
    pool: &PgPool,
    tokens: &TokenService,
    request: &RegisterRequest,
) -> Result<(PublicUser, String), AppError> {
    let email = request.email.trim().to_lowercase();
    let name = request.name.trim().to_string();

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Email already in use".into()));
    }

    let password_hash = hash_password(&request.password)?;

    let user: PublicUser = sqlx::query_as(
        "INSERT INTO users (id, name, email, password_hash)
         VALUES ($1, $2, $3, $4)
         RETURNING id, name, email, created_at, updated_at",
    )
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(pool)
    .await?;

    let token = tokens
        .issue(user.id, &user.email)
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

    Ok((user, token))
}

/// Authenticates a user by email and password and issues a token.
pub async fn login(
    pool: &PgPool,
    tokens: &TokenService,
    request: &LoginRequest,
) -> Result<(PublicUser, String), AppError> {
    let email = request.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as(
        "SELECT id, name, email, password_hash, created_at, updated_at
         FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let user = match user {
        Some(user) => user,
        None => return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into())),
    };

    if !verify_password(&request.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = tokens
        .issue(user.id, &user.email)
        .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

    Ok((user.into(), token))
}

/// Looks up a user by id, as the auth middleware does on every request.
pub async fn get_user_by_id(pool: &PgPool, id: Uuid) -> Result<Option<PublicUser>, AppError> {
    let user: Option<PublicUser> = sqlx::query_as(
        "SELECT id, name, email, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
