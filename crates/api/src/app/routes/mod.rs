use axum::{routing::get, Router};

pub mod admin;
pub mod auth;
pub mod companies;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/users", users::router())
        .nest("/companies", companies::router())
        .nest("/admin", admin::router())
}
