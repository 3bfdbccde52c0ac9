//! Keyword heuristics for save commands, filing and tier routing
//!
//! Every rule here is a case-insensitive substring or token match evaluated in a
//! fixed order; the first matching rule wins. None of it is semantic.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::types::{BRAIN_ZONE, BrainFiling, ChatMessage, Classification, Role, Tier, TierDecision};

/// Save triggers, longest first so `"save this:"` wins over `"save"`.
pub const SAVE_TRIGGERS: &[&str] = &[
    "ray, save this:",
    "ray save this:",
    "ray, save this",
    "ray save this",
    "save to brain",
    "remember this",
    "save this:",
    "save this",
    "save that",
    "note this",
    "save it",
    "save to",
    "save",
];

/// Text following the matched save trigger, with the trigger removed from the
/// original (case-preserved) input.
fn strip_save_trigger(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    SAVE_TRIGGERS.iter().find_map(|trigger| {
        let head = trimmed.get(..trigger.len())?;
        if !head.eq_ignore_ascii_case(trigger) {
            return None;
        }
        let rest = &trimmed[trigger.len()..];
        (rest.is_empty() || trigger.ends_with(':') || rest.starts_with([' ', ':'])).then_some(rest)
    })
}

/// True when `text` is one of the save triggers, or starts with one followed
/// by a space or a colon.
pub fn is_save_command(text: &str) -> bool {
    strip_save_trigger(text).is_some()
}

/// Explicit content carried by a save command, e.g.
/// `"Ray, save this: buy milk"` or `"save buy milk"` gives `"buy milk"`.
/// Case is preserved and colons inside the content are kept.
pub fn save_command_payload(text: &str) -> Option<String> {
    let rest = strip_save_trigger(text)?.trim_start();
    let payload = rest.strip_prefix(':').unwrap_or(rest).trim();
    (!payload.is_empty()).then(|| payload.to_string())
}

/// Content of the latest assistant message with non-blank content.
pub fn find_last_assistant_message(history: &[ChatMessage]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant && !m.content.trim().is_empty())
        .map(|m| m.content.as_str())
}

static MEDICATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(pills?|tablets?|capsules?|doses?|dosage|take|taking|medication|meds|vitamins?)\b|\d\s?mg\b|\bmg\b")
        .expect("medication pattern")
});

static CLOCK_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bat\s+(1[0-2]|0?[1-9])(:[0-5]\d)?\s*(am|pm)\b|\bat (noon|midnight)\b")
        .expect("clock time pattern")
});

static EXERCISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(workout|worked out|ran|run|running|gym|miles?|km|lifted|lifting|yoga|cardio|steps|swim|swam|hiked?|cycling)\b")
        .expect("exercise pattern")
});

static CALENDAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bon (monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b|\b(today|tomorrow|tonight) at\b|\bnext (week|month|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b|\b(appointment|meeting)\b")
        .expect("calendar pattern")
});

const RECURRING_TIME: &[&str] = &[
    "every day at",
    "every day",
    "every morning",
    "every night",
    "every evening",
    "each morning",
    "each night",
    "twice a day",
    "daily",
];

const REMINDER: &[&str] = &["remind me", "nudge me", "reminder", "don't forget", "dont forget"];

const TASK_VERBS: &[&str] = &[
    "call ",
    "email ",
    "buy ",
    "text ",
    "pick up ",
    "schedule ",
    "book ",
    "pay ",
    "send ",
    "finish ",
    "order ",
    "return ",
];

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn has_time_language(text: &str) -> bool {
    contains_any(text, RECURRING_TIME) || CLOCK_TIME.is_match(text)
}

fn classification(zone: &str, subzone: Option<&str>, kind: &str) -> Classification {
    Classification {
        zone: zone.to_string(),
        subzone: subzone.map(String::from),
        kind: kind.to_string(),
    }
}

/// Cross-zone filing for the conversational save path.
///
/// Rules, first match wins: medication, reminder, exercise, task verb,
/// calendar, then the brain default.
pub fn classify_saved_item(text: &str) -> Classification {
    let lower = text.trim().to_lowercase();

    if MEDICATION.is_match(&lower) {
        let kind = if has_time_language(&lower) {
            "reminder"
        } else {
            "note"
        };
        return classification("meds", None, kind);
    }

    if contains_any(&lower, REMINDER) || contains_any(&lower, RECURRING_TIME) {
        return classification("nudges", None, "reminder");
    }

    if EXERCISE.is_match(&lower) {
        return classification("exercise", None, "log");
    }

    if TASK_VERBS.iter().any(|verb| lower.starts_with(verb)) {
        return classification("tasks", Some("personal"), "task");
    }

    if CALENDAR.is_match(&lower) || CLOCK_TIME.is_match(&lower) {
        return classification("calendar", None, "calendar_event");
    }

    classification(BRAIN_ZONE, Some("notes"), "note")
}

const BRAIN_SUBZONES: &[(&str, &[&str])] = &[
    (
        "food",
        &[
            "recipe", "cook", "bake", "meal", "restaurant", "food", "grocery", "groceries",
            "dinner", "lunch", "breakfast", "snack", "ingredient", "milk",
        ],
    ),
    (
        "research",
        &[
            "research", "study", "paper", "article", "learn", "history of", "how does",
            "science", "statistics",
        ],
    ),
    (
        "projects",
        &[
            "project", "roadmap", "milestone", "prototype", "app idea", "launch", "feature",
            "build",
        ],
    ),
    (
        "family",
        &[
            "family", "mom", "dad", "mother", "father", "sister", "brother", "my son",
            "daughter", "wife", "husband", "kids", "grandma", "grandpa", "cousin", "uncle",
            "aunt",
        ],
    ),
    (
        "health_research",
        &[
            "symptom", "diagnosis", "treatment", "doctor", "health", "disease", "supplement",
            "nutrition", "medical", "blood pressure", "cholesterol",
        ],
    ),
];

/// Intra-brain subzone for the direct save path. Defaults to `general`.
pub fn classify_content(text: &str) -> BrainFiling {
    let lower = text.to_lowercase();
    let subzone = BRAIN_SUBZONES
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(name, _)| *name)
        .unwrap_or("general");

    BrainFiling {
        subzone: subzone.to_string(),
        kind: "note".to_string(),
    }
}

const PERSONAL_CUES: &[&str] = &[
    "my ", "i am ", "i'm ", "im ", "i have ", "i've ", "i like ", "i love ", "i hate ",
    "i work ", "i live ", "i was born",
];

/// True when the message reads like the user talking about themselves
pub fn has_personal_cues(text: &str) -> bool {
    let padded = format!(" {} ", text.trim().to_lowercase());
    PERSONAL_CUES
        .iter()
        .any(|cue| padded.contains(&format!(" {cue}")))
}

/// Instruction prompt for the tier classification call
pub fn tier_classification_prompt() -> &'static str {
    r#"You route questions for a personal assistant. Pick exactly one tier:
- Tier 1: simple or general questions, small talk, definitions, quick facts that do not change.
- Tier 2: complex questions that need multi-step reasoning, planning, analysis, comparisons or code.
- Tier 3: questions that need live or current data: news, prices, weather, scores, schedules, anything about "today", "latest" or recent events.

Respond with ONLY valid JSON: {"tier": 1, "reasoning": "one short sentence"}"#
}

/// Strip ```json fences and surrounding prose, returning the outermost JSON object.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    (start < end).then(|| &cleaned[start..=end])
}

/// Parse the classifier's reply; anything unusable yields the tier 1 default.
pub fn parse_tier_decision(raw: &str) -> TierDecision {
    let Some(json) = extract_json_object(raw) else {
        return TierDecision::default();
    };
    let Ok(value) = serde_json::from_str::<Value>(json) else {
        return TierDecision::default();
    };

    let tier = match &value["tier"] {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
    .and_then(|n| u8::try_from(n).ok())
    .and_then(|n| Tier::try_from(n).ok());

    match tier {
        Some(tier) => TierDecision {
            tier,
            reasoning: value["reasoning"]
                .as_str()
                .unwrap_or_default()
                .trim()
                .to_string(),
        },
        None => TierDecision::default(),
    }
}
