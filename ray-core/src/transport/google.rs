//! Google Custom Search JSON API client

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{WebSearch, read_json};
use crate::errors::{RayError, Result};
use crate::types::SearchResult;

pub const DEFAULT_GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// The search API returns at most ten items per page
pub const MAX_RESULTS: u32 = 10;

#[derive(Clone)]
pub struct GoogleSearchClient {
    http: reqwest::Client,
    api_key: Option<String>,
    engine_id: Option<String>,
    base_url: String,
}

impl GoogleSearchClient {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        engine_id: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            engine_id: engine_id.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl WebSearch for GoogleSearchClient {
    async fn search_raw(&self, query: &str, num: u32) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RayError::missing("GOOGLE_API_KEY"))?;
        let engine_id = self
            .engine_id
            .as_deref()
            .ok_or(RayError::missing("GOOGLE_CSE_ID"))?;

        let num = num.clamp(1, MAX_RESULTS).to_string();
        debug!("Web search: q={:?}, num={}", query, num);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", api_key),
                ("cx", engine_id),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        read_json("google-search", response).await
    }
}

/// Pull `{title, snippet, link}` out of a search response's `items`.
/// Items without a link are dropped.
pub fn parse_search_results(raw: &Value) -> Vec<SearchResult> {
    let Some(items) = raw.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let link = item.get("link").and_then(Value::as_str)?.trim();
            if link.is_empty() {
                return None;
            }
            let text = |key: &str| {
                item.get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            };
            Some(SearchResult {
                title: text("title"),
                snippet: text("snippet"),
                link: link.to_string(),
            })
        })
        .collect()
}
