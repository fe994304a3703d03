/// LLM Client — the single point of entry for all Gemini API calls in the coach.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All inference goes through the `InferenceService` trait defined here, so the
/// interview engine can be driven by a scripted fake in tests.
///
/// Two call shapes are supported: multi-turn chat (persona + history + new
/// message) and single-shot generation (one prompt, no history).
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default model used for both dialogue and feedback calls.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("API key required")]
    MissingApiKey,
}

/// How a failed inference call is reported to the candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceFailure {
    QuotaExceeded,
    Service,
}

impl LlmError {
    /// True when the service signalled a rate or usage limit.
    pub fn is_quota(&self) -> bool {
        match self {
            LlmError::Api { status, message } => {
                *status == 429
                    || message.contains("RESOURCE_EXHAUSTED")
                    || message.to_lowercase().contains("quota")
            }
            other => other.to_string().to_lowercase().contains("quota"),
        }
    }

    pub fn classify(&self) -> InferenceFailure {
        if self.is_quota() {
            InferenceFailure::QuotaExceeded
        } else {
            InferenceFailure::Service
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Provider-neutral request shapes
// ────────────────────────────────────────────────────────────────────────────

/// Which side of the conversation produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    /// The model's own earlier replies.
    Model,
    /// The candidate's earlier answers.
    Human,
}

impl ChatRole {
    fn as_gemini(self) -> &'static str {
        match self {
            ChatRole::Model => "model",
            ChatRole::Human => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub parts: Vec<String>,
}

impl ChatMessage {
    pub fn text(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![text.into()],
        }
    }
}

/// A multi-turn chat call: fixed system instruction, prior exchanges, and the
/// message being answered now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub system_instruction: String,
    pub history: Vec<ChatMessage>,
    pub new_message: String,
}

/// The inference service boundary. Carried per session as `Arc<dyn InferenceService>`.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError>;

    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Builds an inference service from the credential a user supplies at runtime.
pub trait InferenceConnector: Send + Sync {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn InferenceService>, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Content<'a> {
    fn new(role: Option<&'a str>, texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            role,
            parts: texts.into_iter().map(|text| Part { text }).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

fn chat_body(request: &ChatRequest) -> GenerateContentRequest<'_> {
    let mut contents: Vec<Content<'_>> = request
        .history
        .iter()
        .map(|m| Content::new(Some(m.role.as_gemini()), m.parts.iter().map(String::as_str)))
        .collect();
    contents.push(Content::new(
        Some(ChatRole::Human.as_gemini()),
        [request.new_message.as_str()],
    ));

    GenerateContentRequest {
        system_instruction: Some(Content::new(None, [request.system_instruction.as_str()])),
        contents,
    }
}

fn prompt_body(prompt: &str) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        system_instruction: None,
        contents: vec![Content::new(Some(ChatRole::Human.as_gemini()), [prompt])],
    }
}

/// Turns a non-success body into an `LlmError::Api`, keeping Gemini's status
/// code name (e.g. `RESOURCE_EXHAUSTED`) in the message.
fn api_error(status: u16, body: String) -> LlmError {
    let message = match serde_json::from_str::<GeminiError>(&body) {
        Ok(e) => match e.error.status {
            Some(code) => format!("{code}: {}", e.error.message),
            None => e.error.message,
        },
        Err(_) => body,
    };
    LlmError::Api { status, message }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini `generateContent` client bound to one API key.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Makes a single call to Gemini. No retries: a failed call is surfaced
    /// immediately and the candidate resubmits.
    async fn send(&self, body: &GenerateContentRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            return Err(api_error(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or(LlmError::EmptyContent)
    }
}

#[async_trait]
impl InferenceService for GeminiClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        debug!(history = request.history.len(), "Sending chat request");
        self.send(&chat_body(&request)).await
    }

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(prompt_len = prompt.len(), "Sending one-shot generation request");
        self.send(&prompt_body(prompt)).await
    }
}

/// Shares one HTTP connection pool across every session's client.
#[derive(Clone)]
pub struct GeminiConnector {
    client: Client,
    base_url: String,
    model: String,
}

impl GeminiConnector {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl InferenceConnector for GeminiConnector {
    fn connect(&self, api_key: &str) -> Result<Arc<dyn InferenceService>, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        Ok(Arc::new(GeminiClient {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            api_key: api_key.trim().to_string(),
        }))
    }
}
