//! Building saved items from requests
//!
//! Two paths create rows. The conversational path ("save this" typed into the
//! chat) files with [`classify_saved_item`]; the direct API path files within
//! the brain zone with [`classify_content`]. Both always write `zone = brain`.

use serde::Deserialize;
use tracing::warn;

use crate::classifier::{
    classify_content, classify_saved_item, find_last_assistant_message, save_command_payload,
};
use crate::errors::{RayError, Result};
use crate::types::{BRAIN_ZONE, ChatMessage, Classification, ItemSource, NewSavedItem};

/// Longest title derived from content
pub const TITLE_LIMIT: usize = 60;

/// First non-blank line of `content`, cut to [`TITLE_LIMIT`] characters.
pub fn derive_title(content: &str) -> String {
    let line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();

    if line.chars().count() <= TITLE_LIMIT {
        return line.to_string();
    }
    let cut: String = line.chars().take(TITLE_LIMIT - 3).collect();
    format!("{}...", cut.trim_end())
}

/// A row for the conversational save path plus the classifier's full decision
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationalSave {
    pub item: NewSavedItem,
    pub classification: Classification,
}

/// Build the row for a save command typed into the chat.
///
/// The explicit text after the trigger wins; otherwise the last assistant
/// answer is saved.
pub fn conversational_save(query: &str, history: &[ChatMessage]) -> Result<ConversationalSave> {
    let (content, source) = match save_command_payload(query) {
        Some(payload) => (payload, ItemSource::UserNote),
        None => match find_last_assistant_message(history) {
            Some(answer) => (answer.trim().to_string(), ItemSource::AssistantAnswer),
            None => return Err(RayError::invalid("there is nothing to save yet")),
        },
    };

    let classification = classify_saved_item(&content);
    let (subzone, tags) = if classification.zone == BRAIN_ZONE {
        (classification.subzone.clone(), None)
    } else {
        (
            Some(classification.zone.clone()),
            Some(format!("zone:{}", classification.zone)),
        )
    };

    Ok(ConversationalSave {
        item: NewSavedItem {
            title: derive_title(&content),
            content,
            zone: BRAIN_ZONE.to_string(),
            subzone,
            kind: classification.kind.clone(),
            tags,
            source,
        },
        classification,
    })
}

/// Fields accepted by the direct save route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSave {
    pub title: Option<String>,
    pub content: Option<String>,
    pub zone: Option<String>,
    pub subzone: Option<String>,
    pub kind: Option<String>,
    pub tags: Option<String>,
    pub zone_hint: Option<String>,
    pub source: Option<String>,
    #[serde(skip)]
    pub history: Vec<ChatMessage>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve a direct save request into a row
pub fn resolve_direct_save(request: DirectSave) -> Result<NewSavedItem> {
    let (content, inferred_source) = match non_blank(request.content) {
        Some(content) => (content, ItemSource::UserNote),
        None => match find_last_assistant_message(&request.history) {
            Some(answer) => (answer.trim().to_string(), ItemSource::AssistantAnswer),
            None => return Err(RayError::invalid("content is required")),
        },
    };

    let title = non_blank(request.title).unwrap_or_else(|| derive_title(&content));
    if title.is_empty() {
        return Err(RayError::invalid("title is required"));
    }

    if let Some(zone) = non_blank(request.zone)
        && zone != BRAIN_ZONE
    {
        warn!("Ignoring requested zone {:?}; items are filed in brain", zone);
    }

    let source = match non_blank(request.source) {
        Some(raw) => ItemSource::parse(&raw).ok_or_else(|| {
            RayError::invalid("source must be assistant_answer or user_note")
        })?,
        None => inferred_source,
    };

    let explicit_subzone = non_blank(request.subzone).or_else(|| non_blank(request.zone_hint));
    let explicit_kind = non_blank(request.kind);
    let filing = classify_content(&format!("{title}\n{content}"));

    Ok(NewSavedItem {
        title,
        content,
        zone: BRAIN_ZONE.to_string(),
        subzone: Some(explicit_subzone.unwrap_or(filing.subzone)),
        kind: explicit_kind.unwrap_or(filing.kind),
        tags: non_blank(request.tags),
        source,
    })
}
