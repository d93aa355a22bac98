//! Axum router configuration with middleware.
//!
//! All routes are under `/api/`.
//! Middleware: permissive CORS (the API is meant to be called from any
//! frontend origin), request tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/optimize", post(handlers::optimize::optimize))
        .route("/api/history", get(handlers::history::history))
        .route("/api/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/health -- simple health check endpoint.
async fn health_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "service": "Promptsmith",
        "version": env!("CARGO_PKG_VERSION"),
        "features": {
            "memory": true,
            "database": "sqlite",
            "provider": state.optimizer.is_some(),
        },
    }))
}
