use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all threads and services
/// (Store, AuthService). It is pulled into the application state via FromRef,
/// embodying the "immutable AppConfig" part of the Unified State Pattern.
#[derive(Clone)]
pub struct AppConfig {
    // HTTP listen port.
    pub port: u16,
    // Document store connection string (MongoDB).
    pub mongo_uri: String,
    // Secret key used to sign and validate JWTs.
    pub jwt_secret: String,
    // Cost factor handed to the bcrypt hashing primitive.
    pub bcrypt_cost: u32,
    // Runtime environment marker. Controls log formatting.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context, used to switch between development conveniences
/// (pretty logs, a default local store URI) and production infrastructure.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            port: 0,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            jwt_secret: "defaultSecret".to_string(),
            // Minimum legal bcrypt cost. Keeps test hashing fast.
            bcrypt_cost: 4,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables.
    ///
    /// The JWT secret intentionally falls back to the fixed string `defaultSecret`
    /// when `JWT_SECRET` is unset. This mirrors the documented (and insecure)
    /// default of the platform; a warning is emitted when it is active.
    ///
    /// # Panics
    /// Panics if `MONGO_URI` is missing in production. This prevents the application
    /// from starting with an incomplete configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, falling back to the default secret");
            "defaultSecret".to_string()
        });

        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|c| c.parse::<u32>().ok())
            .unwrap_or(bcrypt::DEFAULT_COST);

        let mongo_uri = match env {
            // Local development assumes a MongoDB on the default port.
            Env::Local => {
                env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
            }
            // Production demands an explicit store location.
            Env::Production => {
                env::var("MONGO_URI").expect("FATAL: MONGO_URI required in production")
            }
        };

        Self {
            port,
            mongo_uri,
            jwt_secret,
            bcrypt_cost,
            env,
        }
    }
}
