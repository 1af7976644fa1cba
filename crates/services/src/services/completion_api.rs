//! Groq chat-completion client backing the AI features.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

const COMPLETIONS_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
const DEFAULT_MODEL: &str = "llama-3.2-90b-text-preview";

#[derive(Debug, Clone, Error)]
pub enum CompletionApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,
}

impl CompletionApiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling knobs for a single completion call. `Default` leaves everything
/// to the provider.
#[derive(Debug, Clone, Default)]
pub struct CompletionParams {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Request body (OpenAI-compatible wire format)
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: ChatMessage,
}

/// Response from the completions endpoint
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

impl CompletionResponse {
    /// Content of the first choice, the way every caller consumes it.
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

/// Chat-completion API client
#[derive(Debug, Clone)]
pub struct CompletionApiClient {
    http: Client,
    api_key: String,
    model: String,
}

impl CompletionApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Create a new client with the given API key
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, CompletionApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("vyapaar/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CompletionApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Send a completion request, retrying transient failures.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<CompletionResponse, CompletionApiError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        (|| async { self.send_request(&request).await })
            .retry(
                &ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &CompletionApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "completion call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    /// Send a conversation and return the first choice's content.
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        params: CompletionParams,
    ) -> Result<String, CompletionApiError> {
        let response = self.complete(messages, params).await?;
        response
            .text()
            .map(|s| s.to_string())
            .ok_or_else(|| CompletionApiError::Serde("no choices in response".to_string()))
    }

    async fn send_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionApiError> {
        let res = self
            .http
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<CompletionResponse>()
                .await
                .map_err(|e| CompletionApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(CompletionApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(CompletionApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(CompletionApiError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> CompletionApiError {
    if e.is_timeout() {
        CompletionApiError::Timeout
    } else {
        CompletionApiError::Transport(e.to_string())
    }
}
