//! Solace library crate (used by the server binary and integration tests).
//!
//! Solace fronts a generative-language provider and a TTS provider for a
//! mental-wellness chat product. The pipeline behind every endpoint is the
//! same: normalize the conversation, consult a bounded in-memory reply
//! cache, invoke the provider under a retry-with-backoff bound, and relay
//! the result (buffered JSON or SSE chunks). Any upstream failure is
//! absorbed by a supportive fallback response; callers never see a raw
//! provider error.
//!
//! # Module map
//! - [`config`] - environment-backed server configuration
//! - [`chat`] - conversation model and provider-shape normalization
//! - [`cache`] - bounded TTL reply cache with insertion-order eviction
//! - [`upstream`] - provider clients, error taxonomy, backoff invoker
//! - [`fallback`] - supportive canned responses
//! - [`gateway`] - axum router, handlers, SSE relay

pub mod cache;
pub mod chat;
pub mod config;
pub mod fallback;
pub mod gateway;
pub mod upstream;

pub use cache::{ReplyCache, compute_key};
pub use chat::{ChatMessage, NormalizedPrompt, PromptRole, PromptTurn, Role, UserContext, normalize};
pub use config::{Config, ConfigError};
pub use fallback::FallbackGenerator;
pub use gateway::{AppState, GatewayError, create_router};
pub use upstream::{
    ChatProvider, ChunkStream, GenAiClient, SpeechRequest, TtsAudio, UpstreamError, with_backoff,
};

#[cfg(any(test, feature = "mock"))]
pub use upstream::{MockProvider, MockScript};
