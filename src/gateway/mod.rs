//! HTTP gateway (Axum) for the chat, streaming, and TTS endpoints.
//!
//! This module is primarily used by the `solace` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;
pub mod streaming;


use axum::{
    Json, Router,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{chat_handler, tts_handler};
pub use state::AppState;
pub use streaming::stream_handler;

use crate::upstream::ChatProvider;

/// Builds the application router around a shared [`AppState`].
///
/// Every response carries a permissive `Access-Control-Allow-Origin` so the
/// web client can call from any origin; `OPTIONS` on the API routes answers
/// the CORS preflight directly.
pub fn create_router<P: ChatProvider>(state: AppState<P>) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/chat", post(chat_handler::<P>).options(preflight))
        .route(
            "/api/chat/stream",
            post(stream_handler::<P>).options(preflight),
        )
        .route("/api/tts", post(tts_handler::<P>).options(preflight))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}

/// CORS preflight: `204` with permissive headers.
pub async fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "content-type, authorization",
            ),
        ],
    )
        .into_response()
}
