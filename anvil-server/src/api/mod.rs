//! API Module
//!
//! HTTP API layer for the deployment server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod function;
pub mod health;
pub mod identity;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Upper bound for uploaded archives; whole archives are buffered in memory
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/api/health", get(health::health_check))
        // Function endpoints
        .route("/api/functions", post(function::deploy_function))
        .route("/api/functions", get(function::list_functions))
        .route("/api/functions/{name}", get(function::get_function))
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
}
