//! Chat-completion API client used for article summaries.
//!
//! This module speaks the OpenAI-compatible `/chat/completions` contract:
//! a bearer-authenticated POST carrying the model, a system and a user
//! message, an output token limit and a sampling temperature.
//!
//! # Architecture
//!
//! - [`ChatCompletion`]: Core trait defining a single async completion call
//! - [`OpenAiClient`]: HTTP implementation over `reqwest`
//! - [`SummarizeError`]: Every way a single call can fail
//!
//! Calls are never retried. Callers pace their requests and record
//! failures as data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::utils::truncate_for_log;

/// Default API base; the client appends `/chat/completions`.
pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Upper bound on a single completion request.
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from a single chat-completion call.
#[derive(Debug, Error)]
pub enum SummarizeError {
    /// Transport failure: connect, timeout, TLS, body read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The response carried no choice with text content.
    #[error("response contained no summary text")]
    EmptyChoice,
}

/// One message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `/chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Trait for a single async chat completion.
///
/// Implementors send a [`ChatRequest`] and hand back the generated text of
/// the first choice. The summarization loop is generic over this trait so
/// the service can be replaced in tests.
pub trait ChatCompletion {
    /// Send `request` and return the generated text, untrimmed.
    ///
    /// # Errors
    ///
    /// Any transport, status or decoding failure, as a [`SummarizeError`].
    async fn complete(&self, request: &ChatRequest) -> Result<String, SummarizeError>;
}

/// HTTP client for an OpenAI-compatible chat API.
pub struct OpenAiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client for `api_base` (e.g. `https://api.openai.com/v1`).
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(api_base: &str, api_key: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(CHAT_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", api_base.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

impl fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl ChatCompletion for OpenAiClient {
    #[instrument(level = "info", skip_all, fields(model = %request.model))]
    async fn complete(&self, request: &ChatRequest) -> Result<String, SummarizeError> {
        let t0 = Instant::now();
        let body = serde_json::to_string(request)?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(
                elapsed_ms = dt.as_millis() as u64,
                %status,
                body = %truncate_for_log(&text, 300),
                "Chat completion returned an error status"
            );
            return Err(SummarizeError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&text, 300),
            });
        }

        debug!(elapsed_ms = dt.as_millis() as u64, bytes = text.len(), "Chat completion succeeded");
        parse_completion(&text)
    }
}

/// Pull the first choice's text out of a `/chat/completions` body.
fn parse_completion(body: &str) -> Result<String, SummarizeError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(SummarizeError::EmptyChoice)
}
