use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::extractors::AuthenticatedUser;
use crate::auth::token::{extract_from_header, TokenError, TokenService};
use crate::error::AppError;
use crate::services;

/// Routes reachable without a bearer token.
fn is_public(path: &str) -> bool {
    path == "/health"
        || path == "/auth/register"
        || path == "/auth/login"
        || path == "/auth/logout"
}

/// Authentication gate for every protected route.
///
/// Per request: extract the bearer token, verify it, resolve the user it was
/// issued for, and attach the user to the request extensions. Any failure
/// short-circuits with 401 and a generic body; the specific rejection reason
/// only reaches the logs.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    // Rc because the user lookup forces the service call into an async block.
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if is_public(req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let token = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(extract_from_header)
                .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?
                .to_owned();

            let tokens = req
                .app_data::<web::Data<TokenService>>()
                .ok_or_else(|| AppError::Internal("TokenService not configured".into()))?;

            let claims = tokens.verify(&token).map_err(|e| {
                match e {
                    TokenError::Expired => log::info!("rejected expired token"),
                    TokenError::Invalid => log::warn!("rejected invalid token"),
                }
                AppError::from(e)
            })?;

            let pool = req
                .app_data::<web::Data<PgPool>>()
                .ok_or_else(|| AppError::Internal("Database pool not configured".into()))?;

            let user = services::auth::get_user_by_id(pool.get_ref(), claims.sub)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

            req.extensions_mut().insert(AuthenticatedUser(user));

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{get, test::{self}, App, HttpResponse, Responder};

    #[get("/tasks")]
    async fn protected() -> impl Responder {
        HttpResponse::Ok().finish()
    }

    #[get("/health")]
    async fn open() -> impl Responder {
        HttpResponse::Ok().finish()
    }

    // None of these reach the user lookup, so no pool is registered.
    #[actix_rt::test]
    async fn test_missing_token_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(TokenService::new("middleware-test-secret")))
                .wrap(AuthMiddleware)
                .service(protected),
        )
        .await;

        let req = test::TestRequest::get().uri("/tasks").to_request();
        let resp = test::try_call_service(&app, req).await;
        let err = resp.expect_err("request without token should be rejected");
        assert_eq!(err.error_response().status(), 401);
    }

    #[actix_rt::test]
    async fn test_malformed_header_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(TokenService::new("middleware-test-secret")))
                .wrap(AuthMiddleware)
                .service(protected),
        )
        .await;

        for value in ["token-without-scheme", "Basic abc", "Bearer a b"] {
            let req = test::TestRequest::get()
                .uri("/tasks")
                .insert_header((header::AUTHORIZATION, value))
                .to_request();
            let resp = test::try_call_service(&app, req).await;
            let err = resp.expect_err("malformed header should be rejected");
            assert_eq!(err.error_response().status(), 401, "header {:?}", value);
        }
    }

    #[actix_rt::test]
    async fn test_invalid_token_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(TokenService::new("middleware-test-secret")))
                .wrap(AuthMiddleware)
                .service(protected),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/tasks")
            .insert_header((header::AUTHORIZATION, "Bearer not.a.jwt"))
            .to_request();
        let resp = test::try_call_service(&app, req).await;
        let err = resp.expect_err("invalid token should be rejected");
        assert_eq!(err.error_response().status(), 401);
    }

    #[actix_rt::test]
    async fn test_public_paths_skip_the_gate() {
        let app = test::init_service(App::new().wrap(AuthMiddleware).service(open)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[test]
    fn test_public_path_list() {
        assert!(is_public("/health"));
        assert!(is_public("/auth/register"));
        assert!(is_public("/auth/login"));
        assert!(is_public("/auth/logout"));
        assert!(!is_public("/auth/me"));
        assert!(!is_public("/tasks"));
    }
}
