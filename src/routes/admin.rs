use crate::{AppState, auth, handlers, models::Role};
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    routing::get,
};

/// Admin Router Module
///
/// Defines the user-management surface, exclusively accessible to principals
/// holding the ADMIN role. The role gate is attached router-wide here; the
/// token verifier itself is layered on in `create_router`, so requests reach
/// this gate with a Principal already attached (or not at all).
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/users: list all live users.
        // POST /api/users: create a user (password hashed server-side).
        .route(
            "/api/users",
            get(handlers::get_users).post(handlers::create_user),
        )
        // GET/PUT/DELETE /api/users/{id}
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            auth::require_role(Role::Admin, req, next)
        }))
}
