use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that need no credentials. Course reads expose the owner's public
/// profile only; the password hash never leaves the repository layer.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        .route("/", get(handlers::welcome))
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /courses
        // All courses, each with its owner.
        .route("/courses", get(handlers::list_courses))
        // GET /courses/{id}
        // One course, 404 "Course Not Found." when absent.
        .route("/courses/{id}", get(handlers::get_course))
        // POST /users
        // Registration. The password is hashed before persistence.
        .route("/users", post(handlers::register_user))
}
