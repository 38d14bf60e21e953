//! Route definitions for the API server

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Creates the main application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Report queries
        .route("/category-summary", get(handlers::category_summary))
        .route("/performance-summary", get(handlers::performance_summary))
        .route("/diagnostics", get(handlers::brand_diagnostics))
        .route("/facts", get(handlers::list_facts))
        // Cache lifecycle
        .route("/refresh", post(handlers::refresh))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
