//! Buffered chat and TTS handlers.
//!
//! Pipeline per request: validate at the boundary, normalize, consult the
//! reply cache, invoke the provider under the backoff bound, and degrade to
//! the fallback generator on any upstream failure. The fallback path is a
//! well-formed 200 with `fallback: true`; raw upstream errors never reach
//! the caller.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::GatewayError;
use super::payload::{ChatRequest, ChatResponse, TtsRequest, TtsResponse};
use super::state::AppState;
use crate::cache::compute_key;
use crate::chat::normalize;
use crate::upstream::{ChatProvider, SpeechRequest, with_backoff};

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

#[instrument(
    skip(state, request),
    fields(request_id = %Uuid::new_v4(), message_count = request.messages.len())
)]
pub async fn chat_handler<P: ChatProvider>(
    State(state): State<AppState<P>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, GatewayError> {
    if request.messages.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "`messages` must contain at least one message".into(),
        ));
    }
    if request.messages.iter().all(|m| m.content.trim().is_empty()) {
        return Err(GatewayError::InvalidRequest(
            "`messages` must contain non-empty content".into(),
        ));
    }

    let ctx = request.user_context.as_ref();
    let normalized = normalize(&request.messages, ctx);
    let model = state.provider.model_name().to_string();

    // Cache consultation is skipped entirely when no user message exists.
    let cache_key = compute_key(&request.messages);

    if let Some(key) = cache_key.as_deref() {
        if let Some(reply) = state.cache.get(key) {
            info!(hits = state.cache.hits(), "reply cache hit");
            return Ok(Json(ChatResponse {
                response: reply,
                timestamp: now_iso(),
                model,
                personalized: normalized.personalized,
                cached: Some(true),
                fallback: None,
            })
            .into_response());
        }
    }

    let provider = Arc::clone(&state.provider);
    let turns = normalized.turns.clone();
    let outcome = with_backoff(state.chat_max_attempts, || {
        let provider = provider.clone();
        let turns = turns.clone();
        async move { provider.generate(&turns).await }
    })
    .await;

    match outcome {
        Ok(reply) => {
            if let Some(key) = cache_key {
                state.cache.put(key, reply.clone());
            }
            Ok(Json(ChatResponse {
                response: reply,
                timestamp: now_iso(),
                model,
                personalized: normalized.personalized,
                cached: None,
                fallback: None,
            })
            .into_response())
        }
        Err(err) => {
            warn!(error = %err, "chat upstream failed, serving fallback");
            Ok(Json(ChatResponse {
                response: state.fallback.chat_reply(ctx),
                timestamp: now_iso(),
                model,
                personalized: normalized.personalized,
                cached: None,
                fallback: Some(true),
            })
            .into_response())
        }
    }
}

#[instrument(
    skip(state, request),
    fields(request_id = %Uuid::new_v4(), text_chars = request.text.len())
)]
pub async fn tts_handler<P: ChatProvider>(
    State(state): State<AppState<P>>,
    Json(request): Json<TtsRequest>,
) -> Result<Response, GatewayError> {
    if request.text.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "`text` must not be empty".into(),
        ));
    }

    let speech = SpeechRequest {
        text: request.text,
        prompt: request.prompt,
        emotion: request.emotion,
        language_code: request.language_code,
        speaking_rate: request.speaking_rate,
    };

    let model = state.provider.model_name().to_string();
    let voice = state.provider.voice_name().to_string();

    let provider = Arc::clone(&state.provider);
    let outcome = with_backoff(state.tts_max_attempts, || {
        let provider = provider.clone();
        let speech = speech.clone();
        async move { provider.synthesize(&speech).await }
    })
    .await;

    match outcome {
        Ok(audio) => Ok(Json(TtsResponse {
            audio_base64: audio.audio_base64,
            content_type: audio.content_type,
            sample_rate: audio.sample_rate,
            encoding: audio.encoding,
            duration: audio.duration_secs,
            model,
            voice,
            timestamp: now_iso(),
            fallback: None,
            message: None,
        })
        .into_response()),
        Err(err) => {
            warn!(error = %err, "tts upstream failed, serving fallback");
            Ok(Json(TtsResponse {
                audio_base64: String::new(),
                content_type: "audio/pcm".to_string(),
                sample_rate: 24_000,
                encoding: "LINEAR16".to_string(),
                duration: 0.0,
                model,
                voice,
                timestamp: now_iso(),
                fallback: Some(true),
                message: Some(state.fallback.tts_message()),
            })
            .into_response())
        }
    }
}
