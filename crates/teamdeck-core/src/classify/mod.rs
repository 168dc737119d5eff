//! Message classification and natural-language rendering
//!
//! Agent inbox messages arrive as opaque text: sometimes a JSON envelope with
//! a `type` field, sometimes free prose, sometimes markdown. This module turns
//! them into a [`Category`] and a single display line. Everything here is a
//! pure function of its inputs.

mod category;

pub use category::Category;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Plain-text messages longer than this many characters are cut
pub const MAX_PLAIN_CHARS: usize = 150;

/// Appended to truncated text
pub const ELLIPSIS: &str = "...";

/// Marker that betrays a leaked idle-notification envelope in a summary
const IDLE_MARKER: &str = "idle_notification";

static LEADING_BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*(.+?)\*\*").expect("static regex"));

/// A message rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Display text
    pub text: String,
    /// Category of the message
    #[serde(rename = "type")]
    pub category: Category,
}

impl Classification {
    fn new(text: impl Into<String>, category: Category) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }
}

/// Determine the category of a raw message.
///
/// JSON envelopes are classified by their `type`; anything else by keywords.
pub fn classify(text: &str) -> Category {
    if text.trim().is_empty() {
        return Category::Status;
    }

    match parse_envelope(text) {
        Some(Value::Object(map)) => {
            Category::from_envelope_type(map.get("type").and_then(Value::as_str))
        }
        Some(_) => Category::Status,
        None => infer_category(text),
    }
}

/// Keyword inference over human text, first match wins
pub fn infer_category(text: &str) -> Category {
    let lower = text.to_lowercase();
    let has = |needle: &str| lower.contains(needle);

    if has("completed") || has("finished") || text.contains('✓') || text.contains('✅') {
        Category::Completion
    } else if has("question") || text.contains('?') {
        Category::Question
    } else if has("coordin") || has("discuss") || has("help") {
        Category::Coordination
    } else if has("assigned") || has("assignment") {
        Category::Assignment
    } else if has("shutdown") || has("plan approval") {
        Category::System
    } else {
        Category::Status
    }
}

/// Render a raw message (and its optional precomputed summary) for display.
pub fn to_natural(text: &str, summary: Option<&str>) -> Classification {
    if let Some(summary) = summary.filter(|s| is_trusted_summary(s)) {
        return Classification::new(summary, infer_category(summary));
    }

    match parse_envelope(text) {
        Some(envelope) => render_envelope(&envelope),
        None => render_plain(text),
    }
}

/// Summaries that look like JSON or leak the idle marker are not display text
fn is_trusted_summary(summary: &str) -> bool {
    !summary.is_empty() && !summary.contains('{') && !summary.contains(IDLE_MARKER)
}

/// Strict JSON decode; `null` counts as not-an-envelope
fn parse_envelope(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

/// Non-empty string field of an envelope
fn field<'a>(envelope: &'a Value, key: &str) -> Option<&'a str> {
    envelope
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

fn render_envelope(envelope: &Value) -> Classification {
    let kind = envelope.get("type").and_then(Value::as_str);
    let category = Category::from_envelope_type(kind);
    let body = || field(envelope, "message").or_else(|| field(envelope, "content"));
    let approved = truthy(envelope.get("approve"));
    let reason = || {
        field(envelope, "content")
            .map(|c| format!(": {c}"))
            .unwrap_or_default()
    };

    let text = match kind {
        Some("idle_notification") => match field(envelope, "lastTaskSubject") {
            Some(subject) => format!("💤 Finished \"{subject}\" - ready for next task"),
            None => "💤 Available and waiting for assignment".to_string(),
        },
        Some("task_completed") => format!(
            "✅ Completed: {}",
            field(envelope, "taskSubject").unwrap_or("Task")
        ),
        Some("task_assigned") => format!(
            "📋 Started working on: {}",
            field(envelope, "taskSubject").unwrap_or("New task")
        ),
        Some("task_assignment") => format!(
            "📋 Assigned: {}",
            field(envelope, "subject")
                .or_else(|| field(envelope, "taskSubject"))
                .unwrap_or("New task")
        ),
        Some("shutdown_request") => "🔴 Shutdown requested".to_string(),
        Some("shutdown_response") if approved => "✅ Shutdown approved".to_string(),
        Some("shutdown_response") => format!("❌ Shutdown rejected{}", reason()),
        Some("plan_approval_request") => "📝 Plan approval needed".to_string(),
        Some("plan_approval_response") if approved => "✅ Plan approved".to_string(),
        Some("plan_approval_response") => format!("❌ Plan rejected{}", reason()),
        Some("question") => format!("❓ {}", body().unwrap_or("Question raised")),
        Some("coordination") => format!("🤝 {}", body().unwrap_or("Coordinating with team")),
        _ => body().unwrap_or("Message received").to_string(),
    };

    Classification::new(text, category)
}

fn render_plain(text: &str) -> Classification {
    if text.trim().is_empty() {
        return Classification::new("👋 Said hello", Category::Status);
    }

    let clean = if text.starts_with("**") {
        LEADING_BOLD.replace(text, "$1")
    } else {
        text.into()
    };

    // Category comes from the untouched original.
    let category = classify(text);
    Classification::new(truncate_chars(&clean, MAX_PLAIN_CHARS), category)
}

/// Cut to `max` characters, appending [`ELLIPSIS`] when anything was removed
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}{ELLIPSIS}", &text[..idx]),
        None => text.to_string(),
    }
}
