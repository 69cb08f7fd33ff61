pub mod auth;
pub mod health;
pub mod notifications;
pub mod preferences;
pub mod suggestions;
pub mod tasks;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::logout)
            .service(auth::me),
    )
    .service(
        web::scope("/tasks")
            // /stats must precede /{id} so it is not captured as a task id.
            .service(tasks::task_stats)
            .service(tasks::list_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/notifications")
            .service(notifications::mark_all_read)
            .service(notifications::list_notifications)
            .service(notifications::mark_read),
    )
    .service(
        web::scope("/suggestions")
            .service(suggestions::create_suggestion)
            .service(suggestions::list_suggestions)
            .service(suggestions::resolve_suggestion),
    )
    .service(
        web::scope("/preferences")
            .service(preferences::get_preferences)
            .service(preferences::update_preferences),
    );
}
