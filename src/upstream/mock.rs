//! Scripted mock provider for handler and integration tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;

use super::{ChatProvider, ChunkStream, SpeechRequest, TtsAudio, UpstreamError};
use crate::chat::PromptTurn;

/// Scripted behavior for [`MockProvider`]. One script drives all three
/// provider methods.
#[derive(Debug, Clone)]
pub enum MockScript {
    /// Every call succeeds with this reply (streamed as a single chunk).
    Reply(String),

    /// The first `failures` calls are rate limited, then calls succeed.
    RateLimitedThenReply { failures: u32, reply: String },

    /// Every call is rate limited.
    AlwaysRateLimited,

    /// Every call fails hard (non-retryable).
    Fail(String),

    /// Calls are rejected as if no API key were configured.
    MissingKey,

    /// Streaming yields these chunks in order; buffered calls return their
    /// concatenation.
    Chunks(Vec<String>),

    /// Streaming yields these chunks, then an `Err` item mid-stream.
    ChunksThenError { chunks: Vec<String>, error: String },
}

struct MockInner {
    script: MockScript,
    calls: AtomicU32,
}

/// [`ChatProvider`] implementation driven by a [`MockScript`].
#[derive(Clone)]
pub struct MockProvider {
    inner: Arc<MockInner>,
}

impl MockProvider {
    pub fn new(script: MockScript) -> Self {
        Self {
            inner: Arc::new(MockInner {
                script,
                calls: AtomicU32::new(0),
            }),
        }
    }

    /// Number of provider calls made so far (across all methods).
    pub fn calls(&self) -> u32 {
        self.inner.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Result<String, UpstreamError> {
        let call = self.inner.calls.fetch_add(1, Ordering::SeqCst);
        match &self.inner.script {
            MockScript::Reply(reply) => Ok(reply.clone()),
            MockScript::RateLimitedThenReply { failures, reply } => {
                if call < *failures {
                    Err(UpstreamError::RateLimited {
                        retry_after_hint: Some(Duration::from_secs(1)),
                    })
                } else {
                    Ok(reply.clone())
                }
            }
            MockScript::AlwaysRateLimited => Err(UpstreamError::RateLimited {
                retry_after_hint: None,
            }),
            MockScript::Fail(message) => Err(UpstreamError::Failed {
                status: 500,
                message: message.clone(),
            }),
            MockScript::MissingKey => Err(UpstreamError::MissingApiKey),
            MockScript::Chunks(chunks) => Ok(chunks.concat()),
            MockScript::ChunksThenError { .. } => Err(UpstreamError::Failed {
                status: 500,
                message: "stream-only script".into(),
            }),
        }
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    fn model_name(&self) -> &str {
        "mock-model"
    }

    fn voice_name(&self) -> &str {
        "mock-voice"
    }

    async fn generate(&self, _turns: &[PromptTurn]) -> Result<String, UpstreamError> {
        self.next_outcome()
    }

    async fn generate_stream(&self, _turns: &[PromptTurn]) -> Result<ChunkStream, UpstreamError> {
        let call = self.inner.calls.fetch_add(1, Ordering::SeqCst);
        match &self.inner.script {
            MockScript::Reply(reply) => Ok(stream::iter(vec![Ok(reply.clone())]).boxed()),
            MockScript::RateLimitedThenReply { failures, reply } => {
                if call < *failures {
                    Err(UpstreamError::RateLimited {
                        retry_after_hint: None,
                    })
                } else {
                    Ok(stream::iter(vec![Ok(reply.clone())]).boxed())
                }
            }
            MockScript::AlwaysRateLimited => Err(UpstreamError::RateLimited {
                retry_after_hint: None,
            }),
            MockScript::Fail(message) => Err(UpstreamError::Failed {
                status: 500,
                message: message.clone(),
            }),
            MockScript::MissingKey => Err(UpstreamError::MissingApiKey),
            MockScript::Chunks(chunks) => {
                let items: Vec<Result<String, UpstreamError>> =
                    chunks.iter().cloned().map(Ok).collect();
                Ok(stream::iter(items).boxed())
            }
            MockScript::ChunksThenError { chunks, error } => {
                let mut items: Vec<Result<String, UpstreamError>> =
                    chunks.iter().cloned().map(Ok).collect();
                items.push(Err(UpstreamError::Transport(error.clone())));
                Ok(stream::iter(items).boxed())
            }
        }
    }

    async fn synthesize(&self, _request: &SpeechRequest) -> Result<TtsAudio, UpstreamError> {
        self.next_outcome()?;
        Ok(TtsAudio {
            // "mock" in base64; tests only assert the field is non-empty.
            audio_base64: "bW9jaw==".to_string(),
            content_type: "audio/L16;codec=pcm;rate=24000".to_string(),
            sample_rate: 24_000,
            encoding: "LINEAR16".to_string(),
            duration_secs: 1.0,
        })
    }
}
