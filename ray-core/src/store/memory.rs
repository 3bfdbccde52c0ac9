//! In-memory item store
//!
//! Data is lost when the process exits.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

use super::traits::ItemStore;
use crate::errors::Result;
use crate::types::{ItemFilter, NewSavedItem, SavedItem};

#[derive(Default)]
pub struct InMemoryItemStore {
    items: RwLock<Vec<SavedItem>>,
}

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn insert(&self, item: NewSavedItem) -> Result<SavedItem> {
        let row = SavedItem {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            title: item.title,
            content: item.content,
            zone: item.zone,
            subzone: item.subzone,
            kind: item.kind,
            tags: item.tags,
            source: item.source,
        };

        self.items.write().push(row.clone());
        info!("Saved item {} ({:?}/{})", row.id, row.subzone, row.kind);

        Ok(row)
    }

    async fn list(&self, filter: &ItemFilter) -> Result<Vec<SavedItem>> {
        let mut rows: Vec<SavedItem> = self
            .items
            .read()
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect();

        // Insertion order breaks ties between equal timestamps, newest first
        rows.reverse();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BRAIN_ZONE, ItemSource};

    fn new_item(title: &str, subzone: Option<&str>, kind: &str) -> NewSavedItem {
        NewSavedItem {
            title: title.to_string(),
            content: format!("{title} content"),
            zone: BRAIN_ZONE.to_string(),
            subzone: subzone.map(String::from),
            kind: kind.to_string(),
            tags: None,
            source: ItemSource::UserNote,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_identity() {
        let store = InMemoryItemStore::new();
        let row = store.insert(new_item("a", Some("food"), "note")).await.unwrap();

        assert!(!row.id.is_empty());
        assert_eq!(row.title, "a");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders_newest_first() {
        let store = InMemoryItemStore::new();
        store.insert(new_item("first", Some("food"), "note")).await.unwrap();
        store.insert(new_item("second", Some("family"), "note")).await.unwrap();
        store.insert(new_item("third", Some("food"), "recipe")).await.unwrap();

        let all = store.list(&ItemFilter::default()).await.unwrap();
        let titles: Vec<&str> = all.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);

        let food = store
            .list(&ItemFilter {
                subzone: Some("food".into()),
                kind: None,
            })
            .await
            .unwrap();
        assert_eq!(food.len(), 2);

        let recipes = store
            .list(&ItemFilter {
                subzone: Some("food".into()),
                kind: Some("recipe".into()),
            })
            .await
            .unwrap();
        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].title, "third");
    }

    #[tokio::test]
    async fn test_list_ignores_other_zones() {
        let store = InMemoryItemStore::new();
        let mut outside = new_item("pill", None, "note");
        outside.zone = "meds".to_string();
        store.insert(outside).await.unwrap();

        assert!(store.list(&ItemFilter::default()).await.unwrap().is_empty());
        assert!(!store.is_empty());
    }
}
