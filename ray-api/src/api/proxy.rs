use axum::{Json, extract::State, response::IntoResponse};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ray_core::TierModels;
use ray_core::transport::google::MAX_RESULTS;
use ray_core::transport::{CompletionBackend, CompletionRequest, WebSearch, parse_search_results};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{
    error::{ApiError, ApiResult},
    ray::{
        AppJson, CompletionProxyRequest, SearchRequest, SearchResponse, VisionRequest, required,
    },
};

const DEFAULT_SEARCH_RESULTS: u32 = 5;
const DEFAULT_VISION_MAX_TOKENS: u32 = 500;

#[derive(Clone)]
pub struct ProxyState {
    pub completion: Arc<dyn CompletionBackend>,
    pub search: Arc<dyn WebSearch>,
    pub models: TierModels,
}

/// Forward a chat completion; the upstream JSON is returned untouched
pub async fn openai(
    State(state): State<ProxyState>,
    AppJson(request): AppJson<CompletionProxyRequest>,
) -> ApiResult<impl IntoResponse> {
    let messages = request
        .messages
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::BadRequest("messages is required".to_string()))?;
    let model = request
        .model
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| state.models.tier1.clone());

    debug!("Proxying {} messages to {}", messages.len(), model);
    let mut upstream = CompletionRequest::raw(model, messages);
    upstream.max_tokens = request.max_tokens;
    upstream.temperature = request.temperature;

    Ok(Json(state.completion.complete(upstream).await?))
}

/// Strip an optional `data:<mime>;base64,` prefix and check the payload decodes
fn image_payload(raw: &str) -> ApiResult<(String, &str)> {
    let (mime, data) = match raw.strip_prefix("data:").and_then(|r| r.split_once(";base64,")) {
        Some((mime, data)) => (mime.to_string(), data),
        None => ("image/jpeg".to_string(), raw),
    };
    let data = data.trim();

    STANDARD
        .decode(data)
        .map_err(|e| ApiError::BadRequest(format!("base64Image is not valid base64: {e}")))?;

    Ok((mime, data))
}

/// Ask the vision model about an image
pub async fn vision(
    State(state): State<ProxyState>,
    AppJson(request): AppJson<VisionRequest>,
) -> ApiResult<impl IntoResponse> {
    let image = required(request.base64_image, "base64Image")?;
    let prompt = required(request.prompt, "prompt")?;
    let (mime, data) = image_payload(&image)?;

    let message = json!({
        "role": "user",
        "content": [
            {"type": "text", "text": prompt},
            {"type": "image_url", "image_url": {"url": format!("data:{mime};base64,{data}")}}
        ]
    });
    let upstream = CompletionRequest::raw(state.models.vision.clone(), vec![message])
        .max_tokens(request.max_tokens.unwrap_or(DEFAULT_VISION_MAX_TOKENS));

    info!("Vision request with {} bytes of image data", data.len());
    Ok(Json(state.completion.complete(upstream).await?))
}

/// Run a web search and return the parsed results
pub async fn google_search(
    State(state): State<ProxyState>,
    AppJson(request): AppJson<SearchRequest>,
) -> ApiResult<impl IntoResponse> {
    let query = required(request.query, "query")?;
    let num = request
        .num
        .unwrap_or(DEFAULT_SEARCH_RESULTS)
        .clamp(1, MAX_RESULTS);

    let raw = state.search.search_raw(&query, num).await?;
    let results = parse_search_results(&raw);
    debug!("Search for {:?} returned {} results", query, results.len());

    Ok(Json(SearchResponse {
        ok: true,
        query,
        results,
    }))
}
