//! Supabase (PostgREST) item store
//!
//! Rows live in a single table (`ray_items` by default):
//!
//! - `POST /rest/v1/{table}` with `Prefer: return=representation` inserts
//! - `GET /rest/v1/{table}?zone=eq.brain&order=created_at.desc` lists

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::traits::ItemStore;
use crate::errors::{RayError, Result};
use crate::transport::read_json;
use crate::types::{BRAIN_ZONE, ItemFilter, NewSavedItem, SavedItem};

pub const DEFAULT_TABLE: &str = "ray_items";

/// Connection settings for the Supabase REST endpoint
#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub service_key: Option<String>,
    pub table: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_key: None,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct SupabaseItemStore {
    http: reqwest::Client,
    config: SupabaseConfig,
}

impl SupabaseItemStore {
    pub fn new(http: reqwest::Client, config: SupabaseConfig) -> Self {
        Self { http, config }
    }

    /// Table endpoint and service key; both are checked on first use
    fn endpoint(&self) -> Result<(String, &str)> {
        let url = self
            .config
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(RayError::missing("SUPABASE_URL"))?;
        let key = self
            .config
            .service_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(RayError::missing("SUPABASE_SERVICE_ROLE_KEY"))?;

        Ok((
            format!("{}/rest/v1/{}", url.trim_end_matches('/'), self.config.table),
            key,
        ))
    }
}

/// PostgREST query parameters for a listing
pub fn list_query(filter: &ItemFilter) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("select", "*".to_string()),
        ("zone", format!("eq.{BRAIN_ZONE}")),
    ];
    if let Some(subzone) = &filter.subzone {
        query.push(("subzone", format!("eq.{subzone}")));
    }
    if let Some(kind) = &filter.kind {
        query.push(("kind", format!("eq.{kind}")));
    }
    query.push(("order", "created_at.desc".to_string()));
    query
}

/// Ids may come back as numbers (bigserial) or strings (uuid)
fn normalize_row(mut row: Value) -> Result<SavedItem> {
    if let Some(Value::Number(n)) = row.get("id") {
        let id = n.to_string();
        row["id"] = Value::String(id);
    }
    serde_json::from_value(row).map_err(|e| RayError::Store(format!("unexpected row shape: {e}")))
}

#[async_trait]
impl ItemStore for SupabaseItemStore {
    async fn insert(&self, item: NewSavedItem) -> Result<SavedItem> {
        let (endpoint, key) = self.endpoint()?;

        let response = self
            .http
            .post(&endpoint)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Prefer", "return=representation")
            .json(&item)
            .send()
            .await?;

        let body = read_json("supabase", response).await?;
        let row = match body {
            Value::Array(mut rows) if !rows.is_empty() => rows.swap_remove(0),
            Value::Object(_) => body,
            other => {
                return Err(RayError::Store(format!(
                    "insert returned no row: {other}"
                )));
            },
        };

        let saved = normalize_row(row)?;
        info!("Saved item {} to {}", saved.id, self.config.table);
        Ok(saved)
    }

    async fn list(&self, filter: &ItemFilter) -> Result<Vec<SavedItem>> {
        let (endpoint, key) = self.endpoint()?;

        let response = self
            .http
            .get(&endpoint)
            .header("apikey", key)
            .bearer_auth(key)
            .query(&list_query(filter))
            .send()
            .await?;

        let rows = match read_json("supabase", response).await? {
            Value::Array(rows) => rows,
            Value::Null => Vec::new(),
            other => return Err(RayError::Store(format!("expected an array, got {other}"))),
        };
        debug!("Listed {} items", rows.len());

        rows.into_iter().map(normalize_row).collect()
    }
}
