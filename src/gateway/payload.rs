//! Request/response schema for the gateway endpoints.
//!
//! Payloads are validated at the boundary before entering the pipeline;
//! wire field names are camelCase to match the web client.

use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, UserContext};

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub user_context: Option<UserContext>,
}

/// Body of a `200` from `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    /// ISO-8601 response time.
    pub timestamp: String,
    pub model: String,
    pub personalized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

/// Body of `POST /api/chat/stream`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// One SSE frame of the streaming chat endpoint.
///
/// Three shapes share this struct: `{chunk, done: false}` per upstream
/// chunk, `{chunk: "", done: true, fullText}` on completion, and
/// `{error, done: true}` on upstream failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StreamFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<String>,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StreamFrame {
    /// An incremental chunk frame.
    pub fn chunk(text: impl Into<String>) -> Self {
        Self {
            chunk: Some(text.into()),
            done: false,
            full_text: None,
            error: None,
        }
    }

    /// The terminal success frame carrying the accumulated full text.
    pub fn terminal(full_text: impl Into<String>) -> Self {
        Self {
            chunk: Some(String::new()),
            done: true,
            full_text: Some(full_text.into()),
            error: None,
        }
    }

    /// The terminal error frame; the transport closes after this.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            chunk: None,
            done: true,
            full_text: None,
            error: Some(message.into()),
        }
    }
}

/// Body of `POST /api/tts`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    pub text: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub speaking_rate: Option<f32>,
}

/// Body of a `200` from `POST /api/tts`.
///
/// On the fallback path `audio_base64` is empty, `fallback` is `true`, and
/// `message` carries a supportive text substitute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsResponse {
    pub audio_base64: String,
    pub content_type: String,
    pub sample_rate: u32,
    pub encoding: String,
    /// Estimated playback length in seconds.
    pub duration: f64,
    pub model: String,
    pub voice: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
