use crate::{AppState, auth, handlers};
use axum::{
    Router, middleware,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every method router here carries the `require_auth` layer, which resolves the
/// `AuthUser` once per request. The layer is applied per method router rather
/// than on the whole `Router`, so a method nobody registered still falls through
/// to axum's 405 instead of being asked for credentials. Ownership of individual
/// courses is then checked inside the handlers.
pub fn authenticated_routes(state: &AppState) -> Router<AppState> {
    let require_auth = middleware::from_fn_with_state(state.clone(), auth::require_auth);

    Router::<AppState>::new()
        // GET /users
        // The caller's own profile.
        .route(
            "/users",
            get(handlers::get_current_user).route_layer(require_auth.clone()),
        )
        // POST /courses
        // The new course is owned by the caller, whatever the body says.
        .route(
            "/courses",
            post(handlers::create_course).route_layer(require_auth.clone()),
        )
        // PUT/DELETE /courses/{id}
        // Owner-only mutations; 403 for anyone else.
        .route(
            "/courses/{id}",
            put(handlers::update_course)
                .delete(handlers::delete_course)
                .route_layer(require_auth),
        )
}
