#![forbid(unsafe_code)]

//! Blocking client for the Gemini `generateContent` REST API.
//!
//! [`GeminiClient`] implements [`tikzgen_core::Generator`], so it can drive the pipelines and the
//! session directly. Streaming uses the server-sent-events flavour of `streamGenerateContent`.

pub mod sse;
pub mod wire;

use std::io::{BufRead, BufReader};
use std::time::Duration;
use tikzgen_core::{BoxError, Generator, ModelRequest};
use wire::{GenerateContentRequest, GenerateContentResponse};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables consulted by [`GeminiClient::from_env`], in order.
pub const API_KEY_VARS: [&str; 3] = ["TIKZGEN_API_KEY", "GEMINI_API_KEY", "API_KEY"];

/// Thinking budgets of up to 16k tokens make long completions the norm.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("no API key configured (set one of {})", API_KEY_VARS.join(", "))]
    MissingApiKey,
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),
    #[error("model endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode model response")]
    Json(#[from] serde_json::Error),
    #[error("failed to read response stream")]
    Io(#[from] std::io::Error),
    #[error("prompt was blocked: {0}")]
    Blocked(String),
}

pub type Result<T> = std::result::Result<T, GeminiError>;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeminiError::MissingApiKey);
        }
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Reads the key from the first non-empty variable in [`API_KEY_VARS`].
    pub fn from_env() -> Result<Self> {
        let key = API_KEY_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .ok_or(GeminiError::MissingApiKey)?;
        Self::new(key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    pub fn generate_content(&self, request: &ModelRequest) -> Result<String> {
        let url = self.endpoint(&request.model, "generateContent");
        tracing::debug!(model = %request.model, temperature = request.temperature, thinking_budget = ?request.thinking_budget, "generateContent");
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::from(request))
            .send()?;
        let response = check_status(response)?;
        let body: GenerateContentResponse = serde_json::from_str(&response.text()?)?;
        if let Some(reason) = body.block_reason() {
            return Err(GeminiError::Blocked(reason.to_string()));
        }
        Ok(body.text())
    }

    /// Calls `on_chunk` with the answer text of every streamed event.
    pub fn stream_generate_content(
        &self,
        request: &ModelRequest,
        on_chunk: &mut dyn FnMut(&str),
    ) -> Result<()> {
        let url = self.endpoint(&request.model, "streamGenerateContent");
        tracing::debug!(model = %request.model, temperature = request.temperature, thinking_budget = ?request.thinking_budget, "streamGenerateContent");
        let response = self
            .http
            .post(url)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateContentRequest::from(request))
            .send()?;
        let response = check_status(response)?;

        let mut decoder = sse::SseDecoder::new();
        let mut events = 0usize;
        for line in BufReader::new(response).lines() {
            if let Some(payload) = decoder.push_line(&line?) {
                events += 1;
                deliver(&payload, on_chunk)?;
            }
        }
        if let Some(payload) = decoder.finish() {
            events += 1;
            deliver(&payload, on_chunk)?;
        }
        tracing::debug!(events, "stream finished");
        Ok(())
    }
}

fn deliver(payload: &str, on_chunk: &mut dyn FnMut(&str)) -> Result<()> {
    let event: GenerateContentResponse = serde_json::from_str(payload)?;
    if let Some(reason) = event.block_reason() {
        return Err(GeminiError::Blocked(reason.to_string()));
    }
    let text = event.text();
    if !text.is_empty() {
        on_chunk(&text);
    }
    Ok(())
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "model endpoint rejected request");
    Err(GeminiError::Status {
        status: status.as_u16(),
        body,
    })
}

impl Generator for GeminiClient {
    fn generate(&self, request: &ModelRequest) -> std::result::Result<String, BoxError> {
        Ok(self.generate_content(request)?)
    }

    fn generate_stream(
        &self,
        request: &ModelRequest,
        on_chunk: &mut dyn FnMut(&str),
    ) -> std::result::Result<(), BoxError> {
        Ok(self.stream_generate_content(request, on_chunk)?)
    }
}
