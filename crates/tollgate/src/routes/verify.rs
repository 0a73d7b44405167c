//! Verification submission handling.
//!
//! The only place a trust cookie is minted.

use axum::{
    Json,
    body::Body,
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};

use crate::config::ProviderFailurePolicy;
use crate::error::ApiError;
use crate::gate::ClientContext;
use crate::state::AppState;
use tollgate_common::{Submission, SubmissionReply, VerificationResult};

/// Submission bodies are a single short token.
const MAX_SUBMISSION_BYTES: usize = 16 * 1024;

/// Exchange the submitted token with the provider.
///
/// - accepted: 200 `{"success":true}` + trust cookie
/// - rejected or malformed: 401 `{"success":false}`
/// - provider failure: per `turnstile.on_failure`
pub async fn handle_submission(state: &AppState, client: ClientContext, body: Body) -> Response {
    let submission = match axum::body::to_bytes(body, MAX_SUBMISSION_BYTES).await {
        Ok(bytes) => Submission::parse(&bytes),
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable submission body");
            None
        }
    };

    let Some(submission) = submission else {
        tracing::info!(client_ip = ?client.ip, "Malformed verification submission");
        return reply(VerificationResult::Rejected);
    };

    let result = match state.provider.verify(&submission.token, client.ip).await {
        Ok(result) => result,
        Err(e) => {
            let policy = state.config.turnstile.on_failure;
            tracing::warn!(error = %e, policy = ?policy, client_ip = ?client.ip, "Verification provider failed");
            match policy {
                ProviderFailurePolicy::Reject => VerificationResult::Rejected,
                ProviderFailurePolicy::Error => return ApiError(e).into_response(),
            }
        }
    };

    if !result.is_accepted() {
        tracing::info!(client_ip = ?client.ip, "Verification rejected");
        return reply(result);
    }

    let cookie = match state.gate.codec().encode(client.ip) {
        Ok(cookie) => cookie,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode trust cookie");
            return ApiError(e).into_response();
        }
    };

    tracing::info!(
        client_ip = ?client.ip,
        max_age_secs = state.gate.codec().max_age_secs(),
        "Verification accepted, trust cookie issued"
    );

    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(SubmissionReply::from(result)),
    )
        .into_response()
}

fn reply(result: VerificationResult) -> Response {
    let status = if result.is_accepted() {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(SubmissionReply::from(result))).into_response()
}
