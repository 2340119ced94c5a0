use crate::{AppState, auth, handlers, models::Role};
use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Defines the post and comment surface. Every route here sits behind the
/// token verifier applied in `create_router`, so a Principal is always
/// attached by the time these handlers run.
///
/// Access Control Strategy:
/// Reads are open to any authenticated principal. Writes carry a role gate
/// attached per method (ADMIN for posts, USER for comments), so a path like
/// `/api/posts` can expose an ungated GET next to a gated POST. The gates are
/// `auth::require_role` bound to the role each write requires.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Posts ---
        // GET /api/posts (any principal) | POST /api/posts (ADMIN).
        .route(
            "/api/posts",
            post(handlers::create_post)
                .route_layer(middleware::from_fn(|req: Request, next: Next| {
                    auth::require_role(Role::Admin, req, next)
                }))
                .get(handlers::get_posts),
        )
        // GET /api/posts/{id} (any) | PUT/DELETE (ADMIN).
        .route(
            "/api/posts/{id}",
            put(handlers::update_post)
                .delete(handlers::delete_post)
                .route_layer(middleware::from_fn(|req: Request, next: Next| {
                    auth::require_role(Role::Admin, req, next)
                }))
                .get(handlers::get_post),
        )
        // GET /api/posts/genre/{genre}
        // Case-insensitive substring search. Any authenticated principal.
        .route("/api/posts/genre/{genre}", get(handlers::get_posts_by_genre))
        // GET /api/posts/author/{user_id}
        // A user's posts; 400 when the user id is unknown.
        .route(
            "/api/posts/author/{user_id}",
            get(handlers::get_posts_by_author),
        )
        // --- Comments ---
        // GET /api/comments (any principal) | POST /api/comments (USER).
        .route(
            "/api/comments",
            post(handlers::create_comment)
                .route_layer(middleware::from_fn(|req: Request, next: Next| {
                    auth::require_role(Role::User, req, next)
                }))
                .get(handlers::get_comments),
        )
        // GET /api/comments/{id} (any) | PUT/DELETE (USER).
        .route(
            "/api/comments/{id}",
            put(handlers::update_comment)
                .delete(handlers::delete_comment)
                .route_layer(middleware::from_fn(|req: Request, next: Next| {
                    auth::require_role(Role::User, req, next)
                }))
                .get(handlers::get_comment),
        )
        // GET /api/comments/author/{user_id}
        .route(
            "/api/comments/author/{user_id}",
            get(handlers::get_comments_by_author),
        )
}
