//! Type definitions for the Ray relay
//!
//! Messages exchanged with the completion service, saved items persisted in the
//! `ray_items` table, and the small decision records produced by the classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model
    System,
    /// Text written by the user
    User,
    /// Text produced by the assistant
    Assistant,
}

impl Role {
    /// Parse a role name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A role-tagged chat message. Only position gives it identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Where a saved item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Text produced by the assistant and saved by the user
    AssistantAnswer,
    /// Text written by the user
    #[default]
    UserNote,
}

impl ItemSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "assistant_answer" => Some(Self::AssistantAnswer),
            "user_note" => Some(Self::UserNote),
            _ => None,
        }
    }
}

/// The only zone ever written to the `ray_items` table
pub const BRAIN_ZONE: &str = "brain";

/// A persisted row of the `ray_items` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub zone: String,
    pub subzone: Option<String>,
    pub kind: String,
    pub tags: Option<String>,
    pub source: ItemSource,
}

/// Insert payload for a saved item; the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSavedItem {
    pub title: String,
    pub content: String,
    pub zone: String,
    pub subzone: Option<String>,
    pub kind: String,
    pub tags: Option<String>,
    pub source: ItemSource,
}

/// Exact-match filters for listing saved items. `zone = brain` is implied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub subzone: Option<String>,
    pub kind: Option<String>,
}

impl ItemFilter {
    /// True when `item` is in the brain zone and passes every set filter
    pub fn matches(&self, item: &SavedItem) -> bool {
        item.zone == BRAIN_ZONE
            && self
                .subzone
                .as_deref()
                .is_none_or(|s| item.subzone.as_deref() == Some(s))
            && self.kind.as_deref().is_none_or(|k| item.kind == k)
    }
}

/// Routing tier for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    /// Simple or general questions
    Simple = 1,
    /// Questions needing multi-step reasoning
    Complex = 2,
    /// Questions needing live or current data
    Live = 3,
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Simple),
            2 => Ok(Self::Complex),
            3 => Ok(Self::Live),
            other => Err(format!("tier must be 1, 2 or 3, got {other}")),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier as u8
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Outcome of tier classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDecision {
    pub tier: Tier,
    pub reasoning: String,
}

impl Default for TierDecision {
    fn default() -> Self {
        Self {
            tier: Tier::Simple,
            reasoning: "parse failure, defaulting to tier 1".to_string(),
        }
    }
}

/// One web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

/// Cross-zone filing decision for a conversational save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub zone: String,
    pub subzone: Option<String>,
    pub kind: String,
}

/// Intra-brain filing decision for a direct save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainFiling {
    pub subzone: String,
    pub kind: String,
}

/// A personal detail the user volunteered about themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalFact {
    pub category: String,
    pub fact: String,
}

/// Result of the "email me this" side effect, merged into the chat response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailOutcome {
    pub sent: bool,
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
