//! Plain-text extraction from completion responses
//!
//! The completion service answers with `choices[0].message.content` that is
//! either a string or an array of content blocks. Nothing here fails: an empty
//! string means "no text", which callers report as [`RayError::EmptyCompletion`].
//!
//! [`RayError::EmptyCompletion`]: crate::RayError::EmptyCompletion

use serde_json::Value;

/// Text of the first choice, or `""` when none can be found.
pub fn extract_content(response: &Value) -> String {
    flatten_content(&response["choices"][0]["message"]["content"])
}

/// Flatten a message `content` value to text.
///
/// Strings are returned as-is. Arrays yield their `type == "text"` blocks
/// joined by a single space; without any, every block's `text`, `content` or
/// bare string value is joined instead.
pub fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(blocks) => {
            let text_blocks: Vec<&str> = blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect();
            if !text_blocks.is_empty() {
                return text_blocks.join(" ");
            }

            blocks
                .iter()
                .filter_map(|b| match b {
                    Value::String(s) => Some(s.as_str()),
                    other => other
                        .get("text")
                        .and_then(Value::as_str)
                        .or_else(|| other.get("content").and_then(Value::as_str)),
                })
                .collect::<Vec<_>>()
                .join(" ")
        },
        _ => String::new(),
    }
}
