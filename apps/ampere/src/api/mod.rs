//! # Ampere HTTP API Module
//!
//! Serves one live schematic and recompiles it on every read.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /schematic` - The live schematic
//! - `PUT /schematic` - Replace the live schematic
//! - `POST /components` - Add a component
//! - `PUT /components/{id}` - Change a component's value, facing or position
//! - `DELETE /components/{id}` - Remove a component and its connections
//! - `POST /connections` - Add a connection
//! - `POST /connections/remove` - Remove a connection
//! - `PUT /head` - Designate the head component
//! - `GET /network` - Compile the live schematic
//! - `POST /compile` - Compile a posted schematic without storing it
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `AMPERE_CORS_ORIGINS`: Comma-separated allowed origins, or "*" for all (default: localhost only)
//! - `AMPERE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `AMPERE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env, keys_match};
pub use handlers::{
    add_component_handler, add_connection_handler, compile_handler, get_schematic_handler,
    health_handler, network_handler, put_schematic_handler, remove_component_handler,
    remove_connection_handler, set_head_handler, update_component_handler,
};
pub use middleware::{
    DEFAULT_RATE_LIMIT, GlobalRateLimiter, RATE_LIMIT_ENV, create_rate_limiter,
    get_rate_limit_from_env, parse_rate_limit,
};
pub use types::{ComponentRequest, ConnectionRequest, EditResponse, HeadRequest, HealthResponse};

use ampere_core::{AmpereError, Schematic};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (2 MiB).
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Environment variable holding the allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "AMPERE_CORS_ORIGINS";

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the live schematic.
#[derive(Clone)]
pub struct AppState {
    pub schematic: Arc<RwLock<Schematic>>,
}

impl AppState {
    /// Wrap a schematic for sharing across handlers.
    #[must_use]
    pub fn new(schematic: Schematic) -> Self {
        Self {
            schematic: Arc::new(RwLock::new(schematic)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// CORS policy from `AMPERE_CORS_ORIGINS`.
///
/// `*` allows every origin; a comma-separated list allows those origins;
/// unset or unparseable falls back to localhost.
fn build_cors_layer() -> CorsLayer {
    match std::env::var(CORS_ORIGINS_ENV).ok().as_deref() {
        Some("*") => {
            tracing::warn!("CORS: allowing ALL origins ({}=*)", CORS_ORIGINS_ENV);
            CorsLayer::permissive()
        }
        Some(list) => {
            let origins: Vec<HeaderValue> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();
            if origins.is_empty() {
                tracing::warn!("CORS: no valid origins configured, using localhost only");
                cors_for(localhost_origins())
            } else {
                tracing::info!("CORS: allowing {} configured origin(s)", origins.len());
                cors_for(origins)
            }
        }
        None => cors_for(localhost_origins()),
    }
}

fn localhost_origins() -> Vec<HeaderValue> {
    ["localhost", "127.0.0.1"]
        .iter()
        .flat_map(|host| [3000, 8080].map(|port| format!("http://{}:{}", host, port)))
        .filter_map(|origin| origin.parse().ok())
        .collect()
}

fn cors_for(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (unless disabled)
/// 5. Authentication (if a key is configured)
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/schematic",
            get(handlers::get_schematic_handler).put(handlers::put_schematic_handler),
        )
        .route("/components", post(handlers::add_component_handler))
        .route(
            "/components/{id}",
            put(handlers::update_component_handler).delete(handlers::remove_component_handler),
        )
        .route("/connections", post(handlers::add_connection_handler))
        .route(
            "/connections/remove",
            post(handlers::remove_connection_handler),
        )
        .route("/head", put(handlers::set_head_handler))
        .route("/network", get(handlers::network_handler))
        .route("/compile", post(handlers::compile_handler));

    if get_api_key_from_env().is_some() {
        tracing::info!("API key authentication enabled");
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    } else {
        tracing::warn!(
            "API key authentication DISABLED; set {} to require a bearer key",
            API_KEY_ENV
        );
    }

    let rate = get_rate_limit_from_env();
    if rate > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(rate),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve `schematic` on `addr` until Ctrl+C.
pub async fn run_server(addr: &str, schematic: Schematic) -> Result<(), AmpereError> {
    let router = create_router(AppState::new(schematic));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AmpereError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Ampere HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AmpereError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
