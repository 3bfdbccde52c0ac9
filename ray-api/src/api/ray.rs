use axum::{Json, extract::State, response::IntoResponse};
use ray_core::store::ItemStore;
use ray_core::transport::Mailer;
use ray_core::{
    Relay, conversational_save, email_last_answer, history_from_value, is_email_request,
    is_save_command,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    core::services::Services,
    models::{
        error::ApiResult,
        ray::{AppJson, RayRequest, RayResponse, required},
    },
};

/// Reported as `model` for replies that never reach a model
const SAVE_LABEL: &str = "ray-save";
const EMAIL_LABEL: &str = "ray-email";

#[derive(Clone)]
pub struct RayState {
    pub relay: Arc<Relay>,
    pub store: Arc<dyn ItemStore>,
    pub mailer: Arc<dyn Mailer>,
    pub default_email_to: Option<String>,
}

impl RayState {
    pub fn new(services: &Services) -> Self {
        Self {
            relay: services.relay.clone(),
            store: services.store.clone(),
            mailer: services.mailer.clone(),
            default_email_to: services.default_email_to.clone(),
        }
    }
}

/// Chat entry point: save command, email request, or a relayed question
pub async fn ray(
    State(state): State<RayState>,
    AppJson(request): AppJson<RayRequest>,
) -> ApiResult<impl IntoResponse> {
    let query = required(request.query, "query")?;
    let history = history_from_value(request.conversation_history.as_ref());

    if is_save_command(&query) {
        let save = conversational_save(&query, &history)?;
        let saved = state.store.insert(save.item).await?;
        info!("Saved item {} from chat", saved.id);

        let filed = match &saved.subzone {
            Some(subzone) => format!("{}/{}", saved.zone, subzone),
            None => saved.zone.clone(),
        };
        let mut response = RayResponse::local(
            SAVE_LABEL,
            format!("Saved to {filed}: {}", saved.title),
            "save command",
        );
        response.classification = Some(save.classification);
        response.saved_item = Some(saved);
        return Ok(Json(response));
    }

    if is_email_request(&query) {
        let to = request
            .user_email
            .filter(|t| !t.trim().is_empty())
            .or_else(|| state.default_email_to.clone());
        let reply = email_last_answer(state.mailer.as_ref(), &history, to.as_deref()).await;

        let mut response = RayResponse::local(EMAIL_LABEL, reply.message, "email request");
        response.email = Some(reply.outcome);
        return Ok(Json(response));
    }

    let profile = request.user_profile.as_ref();
    let (answer, facts) = tokio::join!(
        state.relay.answer(&query, &history, profile),
        state.relay.extract_personal_facts(&query),
    );

    let mut response = RayResponse::from(answer?);
    if !facts.is_empty() {
        info!("Extracted {} personal details", facts.len());
        response.extracted_personal_details = Some(facts);
    }

    Ok(Json(response))
}
