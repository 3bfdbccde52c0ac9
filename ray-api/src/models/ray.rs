use axum::extract::FromRequest;
use ray_core::save::DirectSave;
use ray_core::{Classification, EmailOutcome, PersonalFact, RelayAnswer, SavedItem, Tier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ApiError;

/// `Json` extractor whose rejections use the API error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RayRequest {
    pub query: Option<String>,
    pub conversation_history: Option<Value>,
    pub user_profile: Option<Value>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RayResponse {
    pub ok: bool,
    pub tier: Tier,
    pub model: String,
    pub message: String,
    pub reasoning: String,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_personal_details: Option<Vec<PersonalFact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_item: Option<SavedItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailOutcome>,
}

impl RayResponse {
    /// A reply produced without a model call (save and email commands)
    pub fn local(model: &str, message: String, reasoning: &str) -> Self {
        Self {
            ok: true,
            tier: Tier::Simple,
            model: model.to_string(),
            message,
            reasoning: reasoning.to_string(),
            sources: Vec::new(),
            extracted_personal_details: None,
            saved_item: None,
            classification: None,
            email: None,
        }
    }
}

impl From<RelayAnswer> for RayResponse {
    fn from(answer: RelayAnswer) -> Self {
        Self {
            ok: true,
            tier: answer.tier,
            model: answer.model,
            message: answer.message,
            reasoning: answer.reasoning,
            sources: answer.sources,
            extracted_personal_details: None,
            saved_item: None,
            classification: None,
            email: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveItemRequest {
    #[serde(flatten)]
    pub item: DirectSave,
    pub conversation_history: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveItemResponse {
    pub success: bool,
    #[serde(flatten)]
    pub item: SavedItem,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemQuery {
    pub subzone: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionProxyRequest {
    pub messages: Option<Vec<Value>>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionRequest {
    #[serde(rename = "base64Image")]
    pub base64_image: Option<String>,
    pub prompt: Option<String>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub num: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub ok: bool,
    pub query: String,
    pub results: Vec<ray_core::SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailResponse {
    pub ok: bool,
    pub to: String,
}

/// Trimmed, non-empty text or a 400 naming the field
pub fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{field} is required")))
}
