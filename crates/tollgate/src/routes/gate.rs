//! The catch-all gate handler.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{
        Request, StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use super::verify;
use crate::challenge::{ChallengePage, render_challenge_page};
use crate::error::ApiError;
use crate::gate::{ClientContext, GateDecision};
use crate::state::AppState;

/// Every request not claimed by another route lands here.
pub async fn gate_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = ClientContext::from_request(request.headers(), peer);

    let decision = state
        .gate
        .decide(request.method(), request.uri(), request.headers(), &client);

    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        client_ip = ?client.ip,
        decision = ?decision,
        "Gate decision"
    );

    match decision {
        GateDecision::HandleSubmission => {
            verify::handle_submission(&state, client, request.into_body()).await
        }
        GateDecision::Forward => match state.upstream.forward(request).await {
            Ok(response) => response,
            Err(e) => ApiError(e).into_response(),
        },
        GateDecision::Challenge { original_path } => challenge(&state, &original_path),
    }
}

fn challenge(state: &AppState, original_path: &str) -> Response {
    let html = render_challenge_page(&ChallengePage {
        title: &state.config.challenge.title,
        site_key: &state.config.turnstile.site_key,
        verify_path: state.gate.verify_path(),
        original_path,
    });

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/html; charset=utf-8"),
            (CACHE_CONTROL, "no-store"),
        ],
        html,
    )
        .into_response()
}
