//! Gateway error surface.
//!
//! Only client input errors reach the wire as failures: upstream trouble is
//! absorbed by the fallback layer before it can become an HTTP error.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request body failed boundary validation (missing/empty fields).
    /// Returned as a structured 400; never retried or substituted.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Structured error body for 4xx responses.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
