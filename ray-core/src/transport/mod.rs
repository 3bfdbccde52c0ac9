//! Upstream service abstractions
//!
//! Each external service the relay talks to sits behind a small async trait so
//! handlers can be exercised against in-memory doubles. HTTP implementations
//! live in the submodules; they all share one `reqwest::Client`.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::errors::Result;
use crate::types::ChatMessage;

pub mod google;
pub mod mock;
pub mod openai;
pub mod resend;

pub use google::{GoogleSearchClient, parse_search_results};
pub use openai::OpenAiClient;
pub use resend::ResendMailer;

/// Request body for a chat completion call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    /// Messages as sent upstream; content may be a string or an array of parts
    pub messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

impl CompletionRequest {
    /// Create a request from plain chat messages
    pub fn new(model: impl Into<String>, messages: &[ChatMessage]) -> Self {
        Self {
            model: model.into(),
            messages: messages
                .iter()
                .map(|m| serde_json::json!({"role": m.role.as_str(), "content": m.content}))
                .collect(),
            max_tokens: None,
            temperature: None,
            response_format: None,
        }
    }

    /// Create a request from raw message values (proxy routes)
    pub fn raw(model: impl Into<String>, messages: Vec<Value>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
            response_format: None,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Ask for a JSON object reply
    pub fn json_object(mut self) -> Self {
        self.response_format = Some(serde_json::json!({"type": "json_object"}));
        self
    }

    /// Text of the last message, for logging and test doubles
    pub fn last_text(&self) -> &str {
        self.messages
            .last()
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Text of the first (system) message
    pub fn system_text(&self) -> &str {
        self.messages
            .first()
            .filter(|m| m.get("role").and_then(Value::as_str) == Some("system"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

/// A chat completion service. Returns the raw upstream JSON.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion; non-2xx answers are `RayError::Upstream`
    async fn complete(&self, request: CompletionRequest) -> Result<Value>;
}

/// A web search service. Returns the raw upstream JSON.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search for `query`, asking for at most `num` results
    async fn search_raw(&self, query: &str, num: u32) -> Result<Value>;
}

/// An email to deliver
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// A transactional email service
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the email, returning the provider's message id
    async fn send(&self, email: OutgoingEmail) -> Result<String>;
}

/// Build the HTTP client shared by all upstream clients
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("ray-relay/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Read a response, turning non-2xx statuses into `RayError::Upstream`
pub(crate) async fn read_json(service: &'static str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!("{} returned HTTP {}: {}", service, status, body);
        return Err(crate::errors::RayError::upstream(
            service,
            status.as_u16(),
            &body,
        ));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}
