//! Model selection per routing tier
//!
//! Each tier maps to a completion model. Tier 3 answers are labelled with the
//! search route instead of a model name; the model that writes the synthesis
//! is configured separately.

use serde::{Deserialize, Serialize};

use crate::types::Tier;

/// Label reported as `model` for answers built from web search results
pub const SEARCH_MODEL_LABEL: &str = "google-search";

/// Model names used by the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierModels {
    /// Simple questions
    pub tier1: String,
    /// Complex questions, and the fallback when search finds nothing
    pub tier2: String,
    /// Reported model for search-backed answers
    pub tier3_label: String,
    /// Tier classification calls
    pub classifier: String,
    /// Search query compression
    pub optimizer: String,
    /// Writes answers from search results
    pub synthesis: String,
    /// Personal-fact extraction
    pub extractor: String,
    /// Image questions
    pub vision: String,
}

impl Default for TierModels {
    fn default() -> Self {
        Self {
            tier1: "gpt-4o-mini".to_string(),
            tier2: "gpt-4o".to_string(),
            tier3_label: SEARCH_MODEL_LABEL.to_string(),
            classifier: "gpt-4o-mini".to_string(),
            optimizer: "gpt-4o-mini".to_string(),
            synthesis: "gpt-4o-mini".to_string(),
            extractor: "gpt-4o-mini".to_string(),
            vision: "gpt-4o".to_string(),
        }
    }
}

impl TierModels {
    /// Model that answers a tier directly. Tier 3 only reaches this when
    /// search is skipped, so it shares the tier 2 model.
    pub fn for_tier(&self, tier: Tier) -> &str {
        match tier {
            Tier::Simple => &self.tier1,
            Tier::Complex | Tier::Live => &self.tier2,
        }
    }
}
