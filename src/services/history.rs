// src/services/history.rs
use serde_json::Value;

use crate::message::{Message, Role, recent};

/// Keep well-formed history entries and cut them to the context window.
///
/// Anything that is not an array counts as no history. Entries need a
/// `user`/`assistant` role and non-empty string content; the rest are dropped
/// without failing the request. This is narrower than the provider accepts:
/// content given as an array of blocks is dropped too, since the widget only
/// ever sends plain text turns.
pub fn sanitize_history(raw: Option<&Value>) -> Vec<Message> {
    let Some(Value::Array(entries)) = raw else {
        return Vec::new();
    };

    let kept: Vec<Message> = entries.iter().filter_map(parse_entry).collect();

    let dropped = entries.len() - kept.len();
    if dropped > 0 {
        tracing::debug!(dropped, "ignored malformed history entries");
    }

    recent(&kept).to_vec()
}

fn parse_entry(entry: &Value) -> Option<Message> {
    let role = Role::parse(entry.get("role")?.as_str()?)?;
    let content = entry.get("content")?.as_str()?;
    if content.is_empty() {
        return None;
    }
    Some(Message { role, content: content.to_string() })
}
