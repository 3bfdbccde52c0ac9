//! Resend transactional email client

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::{Mailer, OutgoingEmail, read_json};
use crate::errors::{RayError, Result};

pub const DEFAULT_RESEND_BASE_URL: &str = "https://api.resend.com";

#[derive(Clone)]
pub struct ResendMailer {
    http: reqwest::Client,
    api_key: Option<String>,
    from: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        from: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            from: from.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RayError::missing("RESEND_API_KEY"))?;

        let response = self
            .http
            .post(format!("{}/emails", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&json!({
                "from": self.from,
                "to": [email.to],
                "subject": email.subject,
                "html": email.html,
            }))
            .send()
            .await?;

        let body = read_json("resend", response).await?;
        let id = body
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        info!("Email accepted by Resend (id: {})", id);
        Ok(id)
    }
}
