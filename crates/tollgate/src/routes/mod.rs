//! HTTP route handlers for Tollgate.

use axum::{Router, http::StatusCode, routing::get};
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

mod gate;
mod health;
mod verify;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Health & Status (GET/HEAD never gated; other methods go through the gate)
        .route(
            &state.config.health_path,
            get(health::health_check).fallback(gate::gate_handler),
        )

        // Everything else: submission, forward, or challenge
        .fallback(gate::gate_handler)

        // Add shared state
        .with_state(state)
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
}
