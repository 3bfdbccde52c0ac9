use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use ray_core::store::ItemStore;
use ray_core::{ItemFilter, history_from_value, resolve_direct_save};
use std::sync::Arc;
use tracing::debug;

use crate::models::{
    error::ApiResult,
    ray::{AppJson, ItemQuery, SaveItemRequest, SaveItemResponse},
};

#[derive(Clone)]
pub struct ItemsState {
    pub store: Arc<dyn ItemStore>,
}

pub async fn create_item(
    State(state): State<ItemsState>,
    AppJson(request): AppJson<SaveItemRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut direct = request.item;
    direct.history = history_from_value(request.conversation_history.as_ref());

    let item = resolve_direct_save(direct)?;
    let saved = state.store.insert(item).await?;

    Ok((
        StatusCode::OK,
        Json(SaveItemResponse {
            success: true,
            item: saved,
        }),
    ))
}

pub async fn list_items(
    State(state): State<ItemsState>,
    Query(query): Query<ItemQuery>,
) -> ApiResult<impl IntoResponse> {
    let blank_to_none = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let filter = ItemFilter {
        subzone: blank_to_none(query.subzone),
        kind: blank_to_none(query.kind),
    };

    let items = state.store.list(&filter).await?;
    debug!("Listing {} items for {:?}", items.len(), filter);

    Ok(Json(items))
}
