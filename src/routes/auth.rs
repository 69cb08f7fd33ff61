use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    auth::{AuthResponse, AuthenticatedUser, LoginRequest, RegisterRequest, TokenService},
    config::Config,
    error::AppError,
    services,
};

pub const AUTH_COOKIE: &str = "auth-token";

/// The auth cookie mirrors the bearer token: httpOnly, SameSite=Strict,
/// 24-hour max-age.
fn auth_cookie<'a>(token: &'a str, config: &Config) -> Cookie<'a> {
    Cookie::build(AUTH_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(SameSite::Strict)
        .max_age(CookieDuration::hours(24))
        .finish()
}

/// Register a new user
///
/// Creates a new user account, sets the auth cookie and returns the user
/// with an authentication token.
#[post("/register")]
pub async fn register(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    config: web::Data<Config>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let (user, token) = services::auth::register(&pool, &tokens, &register_data).await?;

    let cookie = auth_cookie(&token, &config);
    Ok(HttpResponse::Created()
        .cookie(cookie)
        .json(AuthResponse { user, token }))
}

/// Login user
///
/// Authenticates a user, sets the auth cookie and returns the user with an
/// authentication token.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;

    let (user, token) = services::auth::login(&pool, &tokens, &login_data).await?;

    let cookie = auth_cookie(&token, &config);
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(AuthResponse { user, token }))
}

/// Logout
///
/// Stateless on the server side: clears the auth cookie and nothing else.
#[post("/logout")]
pub async fn logout(config: web::Data<Config>) -> impl Responder {
    let mut cookie = auth_cookie("", &config);
    cookie.make_removal();

    HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "message": "Logged out"
    }))
}

/// Current user
///
/// Returns the user resolved by the auth middleware.
#[get("/me")]
pub async fn me(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "user": user.0
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secure: bool) -> Config {
        Config {
            database_url: "postgres://unused".to_string(),
            server_port: 8080,
            server_host: "127.0.0.1".to_string(),
            jwt_secret: "unused".to_string(),
            cookie_secure: secure,
        }
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let config = test_config(false);
        let cookie = auth_cookie("some-token", &config);

        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "some-token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(CookieDuration::hours(24)));
        assert_eq!(cookie.secure(), Some(false));

        let secure_cookie = auth_cookie("some-token", &test_config(true));
        assert_eq!(secure_cookie.secure(), Some(true));
    }
}
