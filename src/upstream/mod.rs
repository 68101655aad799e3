//! Upstream provider clients and the retry-with-backoff invoker.
//!
//! Failure classification is a typed enum, not status-code sniffing at call
//! sites: the HTTP client maps responses into [`UpstreamError`] once, and
//! everything downstream (the backoff invoker, the fallback layer) branches
//! on the variant.

pub mod genai;
pub mod retry;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use genai::GenAiClient;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockProvider, MockScript};
pub use retry::with_backoff;

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::chat::PromptTurn;

/// Errors produced by upstream provider calls.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The provider signalled a rate limit (HTTP 429). The only retryable
    /// class of error.
    #[error("provider rate limited")]
    RateLimited {
        /// Parsed `Retry-After` header, when the provider sent one.
        retry_after_hint: Option<Duration>,
    },

    /// No API key is configured for this provider.
    #[error("missing provider API key")]
    MissingApiKey,

    /// The request never produced a usable response (connect/timeout/body).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider answered, but the payload did not have the expected shape.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    /// Non-rate-limit provider error.
    #[error("provider error {status}: {message}")]
    Failed { status: u16, message: String },
}

impl UpstreamError {
    /// Returns `true` only for [`UpstreamError::RateLimited`]; every other
    /// variant is fatal to the invocation.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// A lazy, finite, non-restartable sequence of text chunks from the provider.
pub type ChunkStream = BoxStream<'static, Result<String, UpstreamError>>;

/// Parameters for a TTS synthesis call.
#[derive(Debug, Clone, Default)]
pub struct SpeechRequest {
    pub text: String,
    pub prompt: Option<String>,
    pub emotion: Option<String>,
    pub language_code: Option<String>,
    pub speaking_rate: Option<f32>,
}

/// Synthesized audio returned by the TTS provider.
#[derive(Debug, Clone)]
pub struct TtsAudio {
    pub audio_base64: String,
    pub content_type: String,
    pub sample_rate: u32,
    pub encoding: String,
    /// Estimated playback length in seconds.
    pub duration_secs: f64,
}

/// Seam between the gateway handlers and the external provider.
///
/// Handlers are generic over this trait so tests can substitute
/// [`MockProvider`] for the real [`GenAiClient`].
#[async_trait]
pub trait ChatProvider: Send + Sync + 'static {
    /// Model identifier reported in responses.
    fn model_name(&self) -> &str;

    /// TTS voice identifier reported in responses.
    fn voice_name(&self) -> &str;

    /// Buffered generation: the full reply text for a normalized conversation.
    async fn generate(&self, turns: &[PromptTurn]) -> Result<String, UpstreamError>;

    /// Streaming generation: an ordered chunk stream for a normalized
    /// conversation. Errors before the first chunk surface here; errors
    /// mid-stream surface as `Err` items on the stream.
    async fn generate_stream(&self, turns: &[PromptTurn]) -> Result<ChunkStream, UpstreamError>;

    /// Text-to-speech synthesis.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<TtsAudio, UpstreamError>;
}
