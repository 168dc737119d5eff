//! Display helpers shared by the CLI and the TUI

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use ratatui::style::Color;

/// Avatar palette, indexed by [`agent_color_index`]
pub const AGENT_PALETTE: [Color; 8] = [
    Color::Rgb(37, 99, 235),  // blue
    Color::Rgb(147, 51, 234), // purple
    Color::Rgb(22, 163, 74),  // green
    Color::Rgb(220, 38, 38),  // red
    Color::Rgb(202, 138, 4),  // yellow
    Color::Rgb(219, 39, 119), // pink
    Color::Rgb(79, 70, 229),  // indigo
    Color::Rgb(249, 115, 22), // orange
];

/// Parse an RFC 3339 timestamp, a naive ISO timestamp (taken as UTC) or
/// epoch milliseconds.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    ts.parse::<i64>().ok().and_then(from_epoch_ms)
}

/// Epoch milliseconds to a UTC datetime
pub fn from_epoch_ms(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// Coarse "time ago" label. Invalid input gives an empty string.
pub fn relative_time(ts: &str, now: DateTime<Utc>) -> String {
    parse_timestamp(ts).map_or_else(String::new, |dt| relative_to(dt, now))
}

/// Coarse "time ago" label for a parsed instant
pub fn relative_to(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// Up to two uppercase initials: `team-lead` -> `TL`, `coder` -> `C`
pub fn agent_initials(name: &str) -> String {
    let parts: Vec<&str> = name.split(['-', '_']).collect();
    let initials: String = if parts.len() >= 2 {
        parts[..2].iter().filter_map(|p| p.chars().next()).collect()
    } else {
        name.chars().take(1).collect()
    };
    initials.to_uppercase()
}

/// Stable palette slot for an agent name
pub fn agent_color_index(name: &str) -> usize {
    let sum: usize = name.encode_utf16().map(usize::from).sum();
    sum % AGENT_PALETTE.len()
}

/// Stable avatar color for an agent name
pub fn agent_color(name: &str) -> Color {
    AGENT_PALETTE[agent_color_index(name)]
}
