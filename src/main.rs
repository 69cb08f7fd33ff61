use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use taskpilot::auth::{AuthMiddleware, TokenService};
use taskpilot::config::Config;
use taskpilot::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let bind_addr = (config.server_host.clone(), config.server_port);
    log::info!("Starting TaskPilot server at {}", config.server_url());

    let tokens = web::Data::new(TokenService::new(&config.jwt_secret));
    let config = web::Data::new(config);
    let pool = web::Data::new(pool);

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(tokens.clone())
            .app_data(config.clone())
            // Registered innermost-first: CORS must sit outermost so
            // preflight requests never reach the auth gate.
            .wrap(AuthMiddleware)
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .service(routes::health::health)
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
