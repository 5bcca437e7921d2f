//! GeminiStreamProvider - streaming REST implementation for Gemini.
//!
//! Calls `models/{model}:streamGenerateContent?alt=sse` and turns the
//! server-sent events into a stream of text deltas.

use crate::sse::SseDecoder;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use neurobot_core::config::DEFAULT_API_BASE_URL;
use neurobot_core::provider::{HistoryEntry, Part, Role};
use neurobot_core::{AppSettings, NeurobotError, Result, SessionRequest, StreamingProvider, TextStream};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Provider implementation that streams from the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiStreamProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiStreamProvider {
    /// Creates a provider for the public endpoint with no request timeout.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Builds a provider from the application settings.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when no API key is configured.
    pub fn from_settings(settings: &AppSettings) -> Result<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                NeurobotError::config(
                    "Gemini API key not configured (set GEMINI_API_KEY or api_key in settings.toml)",
                )
            })?;

        let provider = Self::new(api_key).with_base_url(settings.api_base_url.clone());
        match settings.request_timeout_secs {
            Some(secs) => provider.with_timeout(Duration::from_secs(secs)),
            None => Ok(provider),
        }
    }

    /// Overrides the API base URL (everything before `/models`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Applies an overall timeout to every request, stream included.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NeurobotError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:streamGenerateContent?alt=sse",
            self.base_url
        )
    }
}

#[async_trait]
impl StreamingProvider for GeminiStreamProvider {
    async fn open_stream(&self, request: &SessionRequest) -> Result<TextStream> {
        let body = StreamGenerateContentRequest::from_session(request);
        let url = self.endpoint(&request.model);
        tracing::debug!(
            "[GeminiStreamProvider] POST {} ({} content(s))",
            url,
            body.contents.len()
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| NeurobotError::transport(format!("Gemini API request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            tracing::warn!("[GeminiStreamProvider] HTTP {}: {}", status, body_text);
            return Err(map_http_error(status, body_text));
        }

        Ok(decode_text_stream(response.bytes_stream()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamGenerateContentRequest {
    /// Gemini's `Content` shape is exactly the replayed [`HistoryEntry`].
    contents: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationParams,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationParams {
    temperature: f64,
    top_k: u32,
    top_p: f64,
}

impl StreamGenerateContentRequest {
    fn from_session(request: &SessionRequest) -> Self {
        let mut contents = request.history.clone();
        contents.push(HistoryEntry::text(Role::User, request.message.clone()));

        let system_instruction = (!request.system_instruction.trim().is_empty()).then(|| {
            SystemInstruction {
                parts: vec![Part {
                    text: request.system_instruction.clone(),
                }],
            }
        });

        Self {
            contents,
            system_instruction,
            generation_config: GenerationParams {
                temperature: request.temperature,
                top_k: request.top_k,
                top_p: request.top_p,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    candidates: Option<Vec<Candidate>>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

impl ErrorBody {
    fn describe(&self, fallback: &str) -> String {
        let status_text = self.status.clone().unwrap_or_default();
        let msg = self.message.clone().unwrap_or_else(|| fallback.to_string());
        if status_text.is_empty() {
            msg
        } else {
            format!("{status_text}: {msg}")
        }
    }
}

fn map_http_error(status: StatusCode, body: String) -> NeurobotError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| wrapper.error.describe(&body))
        .unwrap_or_else(|_| body.clone());

    NeurobotError::provider(Some(status.as_u16()), message)
}

/// Extracts the text of the first candidate.
///
/// Returns `None` for chunks without text (usage-only chunks, the final
/// `STOP` chunk, blocked candidates). Thought parts are dropped.
fn chunk_text(chunk: StreamChunk) -> Option<String> {
    let candidate = chunk.candidates?.into_iter().next()?;

    let Some(content) = candidate.content else {
        if let Some(reason) = candidate.finish_reason.as_deref().filter(|r| *r != "STOP") {
            tracing::warn!("[GeminiStreamProvider] Empty candidate, finishReason={}", reason);
        }
        return None;
    };

    let text: String = content
        .parts
        .into_iter()
        .filter(|part| !part.thought)
        .filter_map(|part| part.text)
        .collect();

    (!text.is_empty()).then_some(text)
}

struct DecodeState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String>>,
    finished: bool,
}

impl<S> DecodeState<S> {
    fn push_event(&mut self, data: &str) {
        if data.trim() == "[DONE]" {
            return;
        }

        let chunk = match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::debug!("[GeminiStreamProvider] Skipping malformed event: {}", e);
                return;
            }
        };

        if let Some(error) = &chunk.error {
            tracing::warn!("[GeminiStreamProvider] In-band error: {:?}", error);
            self.pending.push_back(Err(NeurobotError::provider(
                error.code,
                error.describe("stream error"),
            )));
            self.finished = true;
            return;
        }

        if let Some(text) = chunk_text(chunk) {
            self.pending.push_back(Ok(text));
        }
    }
}

/// Turns an SSE byte stream into a stream of text deltas.
///
/// Malformed events are skipped. A read error or an in-band error object
/// is yielded once and ends the stream.
fn decode_text_stream<S, B, E>(bytes: S) -> TextStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = DecodeState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(piece)) => {
                    for event in state.decoder.feed(piece.as_ref()) {
                        state.push_event(&event);
                    }
                }
                Some(Err(e)) => {
                    state
                        .pending
                        .push_back(Err(NeurobotError::transport(format!("Stream read error: {e}"))));
                    state.finished = true;
                }
                None => {
                    if let Some(event) = state.decoder.finish() {
                        state.push_event(&event);
                    }
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}
