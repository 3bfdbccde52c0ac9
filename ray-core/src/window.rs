//! Conversation window building
//!
//! A request carries the client's full history; only the most recent turns are
//! forwarded to the model, framed by the system prompt and the new question.

use serde_json::Value;

use crate::extract::flatten_content;
use crate::types::{ChatMessage, Role};

/// Number of history messages forwarded to the model by default
pub const DEFAULT_HISTORY_LIMIT: usize = 14;

/// `[system] + history.tail(limit) + [user]`
pub fn build_chat_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    new_user_message: &str,
    limit: usize,
) -> Vec<ChatMessage> {
    let tail = &history[history.len().saturating_sub(limit)..];

    let mut messages = Vec::with_capacity(tail.len() + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend_from_slice(tail);
    messages.push(ChatMessage::user(new_user_message));
    messages
}

/// Read client-supplied history leniently.
///
/// Anything that is not an array (absent, `null`, an object) is an empty
/// history. Entries with an unknown role or blank content (including `null`
/// and empty block lists) are skipped and array content is flattened to text.
pub fn history_from_value(value: Option<&Value>) -> Vec<ChatMessage> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let role = Role::parse(entry.get("role")?.as_str()?)?;
            let content = match entry.get("content")? {
                Value::String(s) => s.clone(),
                other => flatten_content(other),
            };
            if content.trim().is_empty() {
                return None;
            }
            Some(ChatMessage { role, content })
        })
        .collect()
}

/// Append what is known about the user to the base system prompt.
pub fn build_system_prompt(base: &str, profile: Option<&Value>) -> String {
    let facts: Vec<String> = match profile {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Array(items) if !items.is_empty() => items
                        .iter()
                        .filter_map(|i| i.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    _ => return None,
                };
                (!text.is_empty()).then(|| format!("- {key}: {text}"))
            })
            .collect(),
        _ => Vec::new(),
    };

    if facts.is_empty() {
        base.to_string()
    } else {
        format!(
            "{base}\n\nWhat you know about the user:\n{}",
            facts.join("\n")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn history(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("q{i}"))
                } else {
                    ChatMessage::assistant(format!("a{i}"))
                }
            })
            .collect()
    }

    #[test]
    fn test_window_is_bounded() {
        for len in [0, 1, 5, 14, 15, 40] {
            let h = history(len);
            let messages = build_chat_messages("sys", &h, "now", DEFAULT_HISTORY_LIMIT);
            assert_eq!(messages.len(), len.min(DEFAULT_HISTORY_LIMIT) + 2);
            assert_eq!(messages[0], ChatMessage::system("sys"));
            assert_eq!(messages.last(), Some(&ChatMessage::user("now")));
        }
    }

    #[test]
    fn test_window_keeps_most_recent_turns() {
        let h = history(20);
        let messages = build_chat_messages("sys", &h, "now", 4);
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "q16", "a17", "q18", "a19", "now"]);
    }

    #[test]
    fn test_history_from_non_array_is_empty() {
        assert!(history_from_value(None).is_empty());
        assert!(history_from_value(Some(&Value::Null)).is_empty());
        assert!(history_from_value(Some(&json!({"role": "user"}))).is_empty());
        assert!(history_from_value(Some(&json!("hi"))).is_empty());
    }

    #[test]
    fn test_history_from_value_is_lenient() {
        let value = json!([
            {"role": "user", "content": "hi"},
            {"role": "tool", "content": "ignored"},
            {"role": "assistant", "content": [{"type": "text", "text": "hello"}]},
            {"role": "assistant"},
            42
        ]);
        let h = history_from_value(Some(&value));
        assert_eq!(
            h,
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")]
        );
    }

    #[test]
    fn test_history_from_value_drops_blank_turns() {
        let value = json!([
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": null},
            {"role": "assistant", "content": []},
            {"role": "user", "content": "   "},
            {"role": "assistant", "content": [{"type": "image_url", "image_url": {"url": "x"}}]},
            {"role": "assistant", "content": "hello"}
        ]);
        let h = history_from_value(Some(&value));
        assert_eq!(
            h,
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")]
        );

        let messages = build_chat_messages("sys", &h, "now", DEFAULT_HISTORY_LIMIT);
        assert!(messages.iter().all(|m| !m.content.trim().is_empty()));
    }

    #[test]
    fn test_system_prompt_with_profile() {
        let profile = json!({"name": "Alex", "city": "Denver", "empty": "", "likes": ["tea", "hiking"]});
        let prompt = build_system_prompt("You are Ray.", Some(&profile));
        assert!(prompt.starts_with("You are Ray.\n\nWhat you know about the user:"));
        assert!(prompt.contains("- name: Alex"));
        assert!(prompt.contains("- likes: tea, hiking"));
        assert!(!prompt.contains("empty"));

        assert_eq!(build_system_prompt("You are Ray.", None), "You are Ray.");
        assert_eq!(
            build_system_prompt("You are Ray.", Some(&json!([]))),
            "You are Ray."
        );
    }
}
