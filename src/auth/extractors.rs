use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::user::PublicUser;

/// Extracts the authenticated user from request extensions.
///
/// Intended for routes protected by `AuthMiddleware`, which validates the
/// token, resolves the user, and inserts it into request extensions.
///
/// If no user is present (e.g. the middleware did not run), the extractor
/// returns `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub PublicUser);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError; // AppError is converted into ActixError via ResponseError
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                // Only reachable when a handler is wired without the
                // middleware; rejecting as unauthorized is the safe default.
                let err = AppError::Unauthorized(
                    "User not found in request. Ensure AuthMiddleware is active.".to_string(),
                );
                ready(Err(err.into()))
            }
        }
    }
}
