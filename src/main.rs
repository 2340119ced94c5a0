use blog_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    services::seed_demo_users,
    store::{MongoStore, StoreState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// The asynchronous entry point for the application, responsible for initializing
/// all core components: Configuration, Logging, Document Store, Seeding, and the
/// HTTP Server.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // Prioritizes the RUST_LOG environment variable, falling back to sensible
    // defaults for local development.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_portal=debug,tower_http=info,axum=trace".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            // LOCAL: pretty output for human readability during debugging.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // PROD: JSON output for ingestion by centralized log aggregators.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Document Store Initialization (MongoDB)
    let mongo = MongoStore::connect(&config.mongo_uri)
        .await
        .expect("FATAL: Failed to connect to MongoDB. Check MONGO_URI.");

    // The unique email index backs the uniqueness invariant on users.
    mongo
        .ensure_indexes()
        .await
        .expect("FATAL: Failed to create store indexes.");

    let store = Arc::new(mongo) as StoreState;

    // 5. Bootstrap Seeding
    // Idempotent: creates the demo accounts only when absent.
    seed_demo_users(&store, config.bcrypt_cost)
        .await
        .expect("FATAL: Failed to seed demo accounts.");

    // 6. Unified State Assembly
    let port = config.port;
    let app_state = AppState::new(store, config);

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await.unwrap();

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:{port}");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{port}/swagger-ui");

    axum::serve(listener, app).await.unwrap();
}
