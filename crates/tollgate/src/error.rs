//! HTTP mapping for [`GateError`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use tollgate_common::GateError;

/// Response-side wrapper so handlers can `?` a [`GateError`].
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Inner detail goes to the log, never to the client.
        let body = json!({
            "success": false,
            "error": self.0.public_message(),
        });

        (status, Json(body)).into_response()
    }
}
