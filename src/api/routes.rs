//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_handler, delete_handler, get_handler, health_handler, put_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /kv/*key` - Store a value (JSON body or `?value=`)
/// - `POST /kv` - Store a key-value pair from a JSON body
/// - `GET /kv/*key` - Read through the cache
/// - `DELETE /kv/*key` - Delete from store and cache
/// - `GET /stats` - Cache and worker pool statistics
/// - `GET /health` - Health check endpoint
///
/// The key is the rest of the path, so keys may contain `/` unencoded.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/kv", post(create_handler))
        .route(
            "/kv/*key",
            get(get_handler).put(put_handler).delete(delete_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
