//! Reqwest-based client for the generative-language provider.
//!
//! Covers the three outbound shapes the gateway needs: buffered generation,
//! SSE streaming generation (`alt=sse`), and TTS synthesis. Responses are
//! classified into [`UpstreamError`] variants here, once, so callers never
//! inspect status codes.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChunkStream, SpeechRequest, TtsAudio, UpstreamError};
use crate::chat::{PromptRole, PromptTurn};
use crate::config::Config;

/// Provider REST base for model invocation.
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Outbound request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect timeout for the shared client.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Sample rate assumed when the TTS response does not declare one.
const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Client for the generative + TTS provider endpoints.
#[derive(Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    tts_api_key: Option<String>,
    model: String,
    tts_model: String,
    voice: String,
}

impl GenAiClient {
    /// Builds a client from configuration. A missing API key is allowed:
    /// calls will fail with [`UpstreamError::MissingApiKey`] and the gateway
    /// degrades to its fallback path.
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            api_key: config.genai_api_key.clone(),
            tts_api_key: config.tts_api_key.clone(),
            model: config.model.clone(),
            tts_model: config.tts_model.clone(),
            voice: config.tts_voice.clone(),
        }
    }

    fn api_key(&self) -> Result<&str, UpstreamError> {
        self.api_key.as_deref().ok_or(UpstreamError::MissingApiKey)
    }

    fn tts_api_key(&self) -> Result<&str, UpstreamError> {
        self.tts_api_key
            .as_deref()
            .ok_or(UpstreamError::MissingApiKey)
    }

    fn wire_contents(turns: &[PromptTurn]) -> Vec<WireContent> {
        turns
            .iter()
            .map(|turn| WireContent {
                role: match turn.role {
                    PromptRole::User => "user",
                    PromptRole::Model => "model",
                },
                parts: vec![WirePart {
                    text: Some(turn.text.clone()),
                    inline_data: None,
                }],
            })
            .collect()
    }

    /// Composes the synthesis prompt: optional style prompt, speaking-rate
    /// steering, and emotion wrap the text to speak.
    ///
    /// The provider exposes no numeric rate knob, so a non-default
    /// `speaking_rate` becomes a pace instruction in the prompt.
    fn speech_prompt(request: &SpeechRequest) -> String {
        let mut prompt = String::new();
        if let Some(style) = request.prompt.as_deref().filter(|s| !s.trim().is_empty()) {
            prompt.push_str(style.trim());
            prompt.push_str("\n\n");
        }
        if let Some(rate) = request.speaking_rate.filter(|r| r.is_finite() && *r > 0.0) {
            if rate < 0.95 {
                prompt.push_str("Speak slowly, with a calm and unhurried pace.\n\n");
            } else if rate > 1.05 {
                prompt.push_str("Speak at a brisk, energetic pace.\n\n");
            }
        }
        match request.emotion.as_deref().filter(|e| !e.trim().is_empty()) {
            Some(emotion) => {
                prompt.push_str(&format!(
                    "Say the following in a {} tone: {}",
                    emotion.trim(),
                    request.text
                ));
            }
            None => prompt.push_str(&request.text),
        }
        prompt
    }
}

#[async_trait::async_trait]
impl super::ChatProvider for GenAiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn voice_name(&self) -> &str {
        &self.voice
    }

    async fn generate(&self, turns: &[PromptTurn]) -> Result<String, UpstreamError> {
        let key = self.api_key()?;
        let url = format!("{}/{}:generateContent?key={}", API_BASE, self.model, key);

        let request = GenerateRequest {
            contents: Self::wire_contents(turns),
            generation_config: None,
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let response = classify_status(response).await?;

        let body: GenerateResponse = response.json().await?;
        let text = body.first_text().ok_or_else(|| {
            UpstreamError::MalformedResponse("no text candidate in response".into())
        })?;

        debug!(model = %self.model, chars = text.len(), "buffered generation complete");
        Ok(text)
    }

    async fn generate_stream(&self, turns: &[PromptTurn]) -> Result<ChunkStream, UpstreamError> {
        let key = self.api_key()?;
        let url = format!(
            "{}/{}:streamGenerateContent?alt=sse&key={}",
            API_BASE, self.model, key
        );

        let request = GenerateRequest {
            contents: Self::wire_contents(turns),
            generation_config: None,
        };

        let response = self.http.post(&url).json(&request).send().await?;
        let response = classify_status(response).await?;

        let mut bytes = response.bytes_stream();

        // Line-buffered SSE parse: each `data:` line is a standalone JSON
        // response carrying zero or more text parts.
        let stream = async_stream::try_stream! {
            let mut buffer = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| UpstreamError::Transport(e.to_string()))?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer.drain(..=line_end);

                    let Some(payload) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if payload.is_empty() || payload == "[DONE]" {
                        continue;
                    }

                    let parsed: GenerateResponse = serde_json::from_str(payload)
                        .map_err(|e| UpstreamError::MalformedResponse(e.to_string()))?;
                    for text in parsed.texts() {
                        if !text.is_empty() {
                            yield text;
                        }
                    }
                }
            }
        };

        Ok(stream.boxed())
    }

    async fn synthesize(&self, request: &SpeechRequest) -> Result<TtsAudio, UpstreamError> {
        let key = self.tts_api_key()?;
        let url = format!("{}/{}:generateContent?key={}", API_BASE, self.tts_model, key);

        let wire = GenerateRequest {
            contents: vec![WireContent {
                role: "user",
                parts: vec![WirePart {
                    text: Some(Self::speech_prompt(request)),
                    inline_data: None,
                }],
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: SpeechConfig {
                    language_code: request.language_code.clone(),
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                },
            }),
        };

        let response = self.http.post(&url).json(&wire).send().await?;
        let response = classify_status(response).await?;

        let body: GenerateResponse = response.json().await?;
        let inline = body.first_inline_data().ok_or_else(|| {
            UpstreamError::MalformedResponse("no audio data in response".into())
        })?;

        let sample_rate = sample_rate_from_mime(&inline.mime_type).unwrap_or(DEFAULT_SAMPLE_RATE);
        let duration_secs = estimate_pcm_duration(&inline.data, sample_rate);

        Ok(TtsAudio {
            audio_base64: inline.data,
            content_type: inline.mime_type,
            sample_rate,
            encoding: "LINEAR16".to_string(),
            duration_secs,
        })
    }
}

impl std::fmt::Debug for GenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenAiClient")
            .field("model", &self.model)
            .field("tts_model", &self.tts_model)
            .field("voice", &self.voice)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Maps a non-success HTTP status into the error taxonomy; passes success
/// responses through untouched.
async fn classify_status(response: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_hint = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(UpstreamError::RateLimited { retry_after_hint });
    }

    let message = response.text().await.unwrap_or_default();
    Err(UpstreamError::Failed {
        status: status.as_u16(),
        message: truncate(&message, 512),
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i < max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        s[..cut].to_string()
    }
}

/// Parses a sample rate from a mime type like `audio/L16;codec=pcm;rate=24000`.
fn sample_rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .filter_map(|part| part.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
}

/// Estimates playback seconds for base64-encoded 16-bit mono PCM.
fn estimate_pcm_duration(base64_audio: &str, sample_rate: u32) -> f64 {
    let padding = base64_audio.bytes().rev().take_while(|b| *b == b'=').count();
    // Degenerate inputs (shorter than one base64 quad) estimate to zero
    // rather than underflowing.
    let decoded_bytes = ((base64_audio.len() / 4) * 3).saturating_sub(padding.min(2));
    decoded_bytes as f64 / (2.0 * sample_rate as f64)
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct WireContent {
    role: &'static str,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireInlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    speech_config: SpeechConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<String>,
    voice_config: VoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidatePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate, if any text exists.
    fn first_text(&self) -> Option<String> {
        let parts = &self.candidates.as_ref()?.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() { None } else { Some(text) }
    }

    /// All text parts across candidates, in order (streaming frames carry
    /// one candidate with one part each in practice).
    fn texts(&self) -> Vec<String> {
        self.candidates
            .iter()
            .flatten()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.clone())
            .collect()
    }

    fn first_inline_data(self) -> Option<InlineData> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .find_map(|p| p.inline_data)
    }
}

#[cfg(test)]
mod genai_tests {
    use super::*;

    #[test]
    fn test_sample_rate_from_mime() {
        assert_eq!(
            sample_rate_from_mime("audio/L16;codec=pcm;rate=24000"),
            Some(24_000)
        );
        assert_eq!(sample_rate_from_mime("audio/L16; rate=16000"), Some(16_000));
        assert_eq!(sample_rate_from_mime("audio/pcm"), None);
    }

    #[test]
    fn test_estimate_pcm_duration() {
        // 48000 raw bytes = 1 second of 16-bit mono at 24kHz; base64 expands 3:4.
        let encoded_len = 48_000 / 3 * 4;
        let audio = "A".repeat(encoded_len);
        let secs = estimate_pcm_duration(&audio, 24_000);
        assert!((secs - 1.0).abs() < 0.01, "got {secs}");
    }

    #[test]
    fn test_estimate_pcm_duration_degenerate_inputs() {
        // Shorter than one base64 quad, with and without padding bytes.
        assert_eq!(estimate_pcm_duration("", 24_000), 0.0);
        assert_eq!(estimate_pcm_duration("=", 24_000), 0.0);
        assert_eq!(estimate_pcm_duration("==", 24_000), 0.0);
        assert_eq!(estimate_pcm_duration("QQ", 24_000), 0.0);
    }

    #[test]
    fn test_first_text_concatenates_parts() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(body.first_text().as_deref(), Some("Hello, world"));
    }

    #[test]
    fn test_first_text_none_when_empty() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(body.first_text().is_none());

        let body: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(body.first_text().is_none());
    }

    #[test]
    fn test_inline_data_extraction() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"inlineData":{"mimeType":"audio/L16;rate=24000","data":"QUJD"}}
            ]}}]}"#,
        )
        .unwrap();
        let inline = body.first_inline_data().unwrap();
        assert_eq!(inline.mime_type, "audio/L16;rate=24000");
        assert_eq!(inline.data, "QUJD");
    }

    #[test]
    fn test_speech_prompt_wraps_emotion() {
        let request = SpeechRequest {
            text: "You are doing great.".into(),
            emotion: Some("calm".into()),
            ..Default::default()
        };
        let prompt = GenAiClient::speech_prompt(&request);
        assert_eq!(
            prompt,
            "Say the following in a calm tone: You are doing great."
        );
    }

    #[test]
    fn test_speech_prompt_plain_text() {
        let request = SpeechRequest {
            text: "Breathe in.".into(),
            ..Default::default()
        };
        assert_eq!(GenAiClient::speech_prompt(&request), "Breathe in.");
    }

    #[test]
    fn test_speech_prompt_steers_speaking_rate() {
        let slow = SpeechRequest {
            text: "Breathe in.".into(),
            speaking_rate: Some(0.8),
            ..Default::default()
        };
        let prompt = GenAiClient::speech_prompt(&slow);
        assert!(prompt.contains("Speak slowly"), "got: {prompt}");
        assert!(prompt.ends_with("Breathe in."));

        let fast = SpeechRequest {
            text: "Breathe in.".into(),
            speaking_rate: Some(1.5),
            ..Default::default()
        };
        assert!(GenAiClient::speech_prompt(&fast).contains("brisk"));

        // The default rate adds no instruction.
        let normal = SpeechRequest {
            text: "Breathe in.".into(),
            speaking_rate: Some(1.0),
            ..Default::default()
        };
        assert_eq!(GenAiClient::speech_prompt(&normal), "Breathe in.");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "é".repeat(300);
        let t = truncate(&s, 512);
        assert!(t.len() <= 512);
        assert!(t.chars().all(|c| c == 'é'));
    }
}
