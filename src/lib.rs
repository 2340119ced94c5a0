use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;
pub mod validate;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use config::AppConfig;
pub use services::{AuthService, CommentService, PostService, UserService};
pub use store::{MemoryStore, MongoStore, StoreState};

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas that have been decorated with
/// the `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::login,
        handlers::get_users, handlers::get_user, handlers::create_user,
        handlers::update_user, handlers::delete_user,
        handlers::get_posts, handlers::get_post, handlers::get_posts_by_genre,
        handlers::get_posts_by_author, handlers::create_post, handlers::update_post,
        handlers::delete_post,
        handlers::get_comments, handlers::get_comment, handlers::get_comments_by_author,
        handlers::create_comment, handlers::update_comment, handlers::delete_comment
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::Role, models::UserResponse, models::Post, models::Comment,
            models::PostResponse, models::CommentResponse, models::CommentSummary,
            models::LoginRequest, models::LoginResponse, models::AuthPayload,
            models::CreateUserRequest, models::UpdateUserRequest,
            models::CreatePostRequest, models::UpdatePostRequest,
            models::CreateCommentRequest, models::UpdateCommentRequest,
            validate::FieldError,
        )
    ),
    tags(
        (name = "blog-portal", description = "Blog Platform API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe, and immutable
/// container holding all essential application services and configuration.
/// The application state is shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Store Layer: abstracts document-store access behind the Store trait.
    pub store: StoreState,
    /// Resource Services: the CRUD + cross-reference protocol per entity.
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    /// Auth Service: credential verification and token issue.
    pub auth: AuthService,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Wires every service onto the shared store handle and configuration.
    /// Construction is the single place dependencies are injected, which keeps
    /// the authorization pipeline unit-testable in isolation.
    pub fn new(store: StoreState, config: AppConfig) -> Self {
        Self {
            users: UserService::new(store.clone(), config.bcrypt_cost),
            posts: PostService::new(store.clone()),
            comments: CommentService::new(store.clone()),
            auth: AuthService::new(store.clone(), config.jwt_secret.clone()),
            store,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow middleware and handlers to selectively pull
// components from the shared AppState.

impl FromRef<AppState> for StoreState {
    fn from_ref(app_state: &AppState) -> StoreState {
        app_state.store.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Protected Routes: post/comment surface plus user management, all
        // behind the token verifier. Role gates are attached inside the route
        // modules; the verifier wraps them, so it always runs first and the
        // gates can rely on the Principal being attached.
        .merge(
            authenticated::authenticated_routes()
                .merge(admin::admin_routes())
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth::verify_token,
                )),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle in a
                // tracing span correlated by the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: return the x-request-id header to
                // the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI, so every log
/// line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
