//! Health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::config::CookieMode;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    cookie_mode: CookieMode,
}

/// Basic health check (is the server running?)
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        cookie_mode: state.config.cookie.mode,
    })
}
