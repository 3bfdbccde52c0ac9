//! Storage trait definitions

use async_trait::async_trait;

use crate::errors::Result;
use crate::types::{ItemFilter, NewSavedItem, SavedItem};

/// Trait for saved item storage backends
///
/// Implementations must be thread-safe (Send + Sync) as they are shared by
/// every request handler.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a row and return it with its generated `id` and `created_at`
    async fn insert(&self, item: NewSavedItem) -> Result<SavedItem>;

    /// Brain-zone rows matching `filter`, newest first
    async fn list(&self, filter: &ItemFilter) -> Result<Vec<SavedItem>>;
}
