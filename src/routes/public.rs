use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client: the liveness probe and the login gateway. Everything else in the
/// API sits behind the token verifier.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load
        // balancer checks. Returns "ok" immediately.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login
        // Credential verification and token issue. The only write endpoint
        // reachable without a token.
        .route("/api/auth/login", post(handlers::login))
}
