//! OpenAI-compatible chat completion client

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{CompletionBackend, CompletionRequest, read_json};
use crate::errors::{RayError, Result};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completion client. The API key is checked per call so a missing key
/// only fails the routes that need it.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RayError::missing("OPENAI_API_KEY"))?;

        debug!(
            "Completion request: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        read_json("openai", response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = OpenAiClient::new(reqwest::Client::new(), None, "http://localhost:9/v1/");
        assert_eq!(client.endpoint(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let client = OpenAiClient::new(
            reqwest::Client::new(),
            Some("   ".to_string()),
            DEFAULT_OPENAI_BASE_URL,
        );
        let err = client
            .complete(CompletionRequest::new("gpt-4o", &[ChatMessage::user("hi")]))
            .await
            .unwrap_err();
        assert!(err.is_config_error());
    }
}
