//! SSE relay for the streaming chat endpoint.
//!
//! Each upstream chunk is forwarded as its own `data:` frame as soon as it
//! arrives; the relay yields back to the transport between chunks instead of
//! buffering the reply, which is the whole point of streaming. A running
//! full-text buffer feeds the terminal frame. On an upstream error the relay
//! emits a terminal error frame and ends the stream; it never leaves the
//! transport open past a failure. If the client disconnects, axum drops the
//! relay future, which drops the upstream stream handle with it.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, Sse},
};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::error::GatewayError;
use super::payload::{StreamFrame, StreamRequest};
use super::state::AppState;
use crate::chat::{ChatMessage, Role, normalize};
use crate::upstream::{ChatProvider, ChunkStream, with_backoff};

type EventStream = BoxStream<'static, Result<Event, Infallible>>;

#[instrument(
    skip(state, request),
    fields(request_id = %Uuid::new_v4(), history_len = request.history.len())
)]
pub async fn stream_handler<P: ChatProvider>(
    State(state): State<AppState<P>>,
    Json(request): Json<StreamRequest>,
) -> Result<Sse<EventStream>, GatewayError> {
    if request.message.trim().is_empty() {
        return Err(GatewayError::InvalidRequest(
            "`message` must not be empty".into(),
        ));
    }

    let mut messages = request.history;
    messages.push(ChatMessage::new(Role::User, request.message));
    let normalized = normalize(&messages, None);

    let provider = Arc::clone(&state.provider);
    let turns = normalized.turns;
    let upstream = with_backoff(state.chat_max_attempts, || {
        let provider = provider.clone();
        let turns = turns.clone();
        async move { provider.generate_stream(&turns).await }
    })
    .await;

    let events = match upstream {
        Ok(chunks) => relay(chunks),
        Err(err) => {
            // Stream init failed entirely: stream a fallback text so the
            // caller still gets a well-formed chunk + terminal pair.
            warn!(error = %err, "stream init failed, serving fallback");
            let text = state.fallback.chat_reply(None);
            let frames = vec![
                frame_event(&StreamFrame::chunk(text.clone())),
                frame_event(&StreamFrame::terminal(text)),
            ];
            futures_util::stream::iter(frames.into_iter().map(Ok)).boxed()
        }
    };

    Ok(Sse::new(events))
}

/// Forwards upstream chunks one-to-one, strictly in order, then emits the
/// terminal frame with the accumulated full text.
fn relay(mut chunks: ChunkStream) -> EventStream {
    let stream = async_stream::stream! {
        let mut full_text = String::new();

        while let Some(item) = chunks.next().await {
            match item {
                Ok(text) => {
                    full_text.push_str(&text);
                    yield Ok(frame_event(&StreamFrame::chunk(text)));
                }
                Err(err) => {
                    error!(error = %err, "upstream stream error, closing");
                    yield Ok(frame_event(&StreamFrame::error(
                        "The response was interrupted. Please try again.",
                    )));
                    return;
                }
            }
        }

        yield Ok(frame_event(&StreamFrame::terminal(full_text)));
    };

    stream.boxed()
}

/// Serializes a frame into an SSE event. The frame schema cannot fail to
/// serialize; the comment branch exists so a bug degrades to a no-op frame
/// instead of a panic.
fn frame_event(frame: &StreamFrame) -> Event {
    match serde_json::to_string(frame) {
        Ok(json) => Event::default().data(json),
        Err(err) => {
            error!(error = %err, "failed to serialize stream frame");
            Event::default().comment("serialization-error")
        }
    }
}
