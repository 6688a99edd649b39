use crate::presentation::auth::{login, signup};
use crate::presentation::handlers::{
    delete_user, get_user, health_check, json_error_handler, list_users, update_user,
};
use actix_web::web;

pub const ROUTES: &str = "GET /health, POST /signup, POST /login, GET /users, GET /user/{id}, PUT /user/{id}, DELETE /user/{id}";

/// One handler per method and path.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .route("/health", web::get().to(health_check))
        .route("/signup", web::post().to(signup))
        .route("/login", web::post().to(login))
        .route("/users", web::get().to(list_users))
        .service(
            web::resource("/user/{id}")
                .route(web::get().to(get_user))
                .route(web::put().to(update_user))
                .route(web::delete().to(delete_user)),
        );
}
