use axum::{Json, extract::State, response::IntoResponse};
use ray_core::email::DEFAULT_SUBJECT;
use ray_core::transport::{Mailer, OutgoingEmail};
use std::sync::Arc;
use tracing::info;

use crate::models::{
    error::{ApiError, ApiResult},
    ray::{AppJson, SendEmailRequest, SendEmailResponse, required},
};

#[derive(Clone)]
pub struct EmailState {
    pub mailer: Arc<dyn Mailer>,
    pub default_to: Option<String>,
}

/// Send an email through the configured provider
pub async fn send_email(
    State(state): State<EmailState>,
    AppJson(request): AppJson<SendEmailRequest>,
) -> ApiResult<impl IntoResponse> {
    let to = request
        .to
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or(state.default_to)
        .ok_or_else(|| {
            ApiError::BadRequest("to is required (no default recipient configured)".to_string())
        })?;
    let html = required(request.html, "html")?;
    let subject = request
        .subject
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SUBJECT.to_string());

    let id = state
        .mailer
        .send(OutgoingEmail {
            to: to.clone(),
            subject,
            html,
        })
        .await?;
    info!("Sent email {} to {}", id, to);

    Ok(Json(SendEmailResponse { ok: true, to }))
}
