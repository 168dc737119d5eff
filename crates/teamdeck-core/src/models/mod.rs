//! Data models for TeamDeck

mod inbox;
mod output;
mod stats;
mod team;

pub use inbox::*;
pub use output::*;
pub use stats::*;
pub use team::*;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a string or a number where the backend is inconsistent about ids
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// A list of ids; numbers become strings, `null` or a non-list is empty
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// A byte count that may arrive as a float or a numeric string
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let number = match &value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f.max(0.0).round() as u64),
        _ => None,
    };
    Ok(number.unwrap_or_default())
}
