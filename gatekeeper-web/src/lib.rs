//! Gatekeeper Web Server
//!
//! HTTP adapter for the gatekeeper: every request passes through the gate
//! middleware before reaching the routes or the static file fallback.

pub mod auth;
pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod responses;
pub mod routes;
pub mod server;
pub mod state;

// Re-export main types
pub use server::GatekeeperServer;
pub use state::AppState;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    Router,
};
use gatekeeper_core::GatekeeperConfig;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ]))
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([
            AUTHORIZATION,
            ACCEPT,
            CONTENT_TYPE,
            HeaderName::from_static("xsrf"),
        ])
        .expose_headers([HeaderName::from_static("xsrf")]);

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .merge(routes::gate_routes())
        // Static file serving for everything else
        .fallback_service(static_files)
        // Every request, including static files, goes through the gate
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Static files directory, served at `/`
    pub static_dir: String,
    /// SQLite URL for session storage; sessions stay in memory when unset
    pub database_url: Option<String>,
    /// Gatekeeper TOML configuration file
    pub config_path: Option<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: "static".to_string(),
            database_url: None,
            config_path: None,
        }
    }
}

impl WebConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("GATEKEEPER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("GATEKEEPER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            static_dir: std::env::var("GATEKEEPER_STATIC_DIR")
                .unwrap_or_else(|_| "static".to_string()),
            database_url: std::env::var("GATEKEEPER_DATABASE_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .ok(),
            config_path: std::env::var("GATEKEEPER_CONFIG").ok(),
        }
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Gatekeeper settings from `config_path`, or the built-in defaults
    pub fn load_gatekeeper_config(&self) -> WebResult<GatekeeperConfig> {
        match &self.config_path {
            Some(path) => Ok(GatekeeperConfig::from_file(path)?),
            None => Ok(GatekeeperConfig::default()),
        }
    }
}

/// Error types for the web server
#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Gatekeeper error: {0}")]
    Core(#[from] gatekeeper_core::GatekeeperError),

    #[error("Application error: {0}")]
    Application(#[from] gatekeeper_applications::ApplicationError),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for web operations
pub type WebResult<T> = Result<T, WebError>;

/// Initialize logging for the web server
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gatekeeper_web=debug,gatekeeper_applications=debug,tower_http=debug".into()
            }),
        )
        .init();
}
