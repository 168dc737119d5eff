//! Readable message feed built from team inboxes

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::{to_natural, Category};
use crate::format::parse_timestamp;
use crate::models::{AllInboxes, InboxMessage, Team, TeamInboxes};

/// Messages shown per team
pub const DEFAULT_FEED_LIMIT: usize = 50;

/// One classified inbox message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    /// Team the inbox belongs to
    pub team: String,
    /// Inbox owner (recipient)
    pub agent: String,
    /// Sender; the inbox owner when the message does not say
    pub from: String,
    /// Natural-language rendering
    pub text: String,
    /// Original message body
    pub full_text: String,
    /// Category from the classifier
    pub category: Category,
    /// Sender-provided summary
    pub summary: Option<String>,
    /// Send time, when it parses
    pub timestamp: Option<DateTime<Utc>>,
    /// Sender colour as given in the message
    pub color: Option<String>,
    /// Whether the recipient has read it
    pub read: bool,
}

impl FeedItem {
    /// Classify one inbox message
    pub fn from_message(team: &str, agent: &str, message: &InboxMessage) -> Self {
        let natural = to_natural(&message.text, message.summary.as_deref());
        Self {
            team: team.to_string(),
            agent: agent.to_string(),
            from: message
                .from
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| agent.to_string()),
            text: natural.text,
            full_text: message.text.clone(),
            category: natural.category,
            summary: message.summary.clone(),
            timestamp: message.timestamp.as_deref().and_then(parse_timestamp),
            color: message.color.clone(),
            read: message.read,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.full_text.to_lowercase().contains(needle)
            || self.text.to_lowercase().contains(needle)
            || self.from.to_lowercase().contains(needle)
            || self
                .summary
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(needle))
    }
}

fn team_items<'a>(team: &str, inboxes: &'a TeamInboxes) -> impl Iterator<Item = FeedItem> + 'a {
    let team = team.to_string();
    inboxes.iter().flat_map(move |(agent, inbox)| {
        let team = team.clone();
        inbox
            .messages
            .iter()
            .map(move |m| FeedItem::from_message(&team, agent, m))
    })
}

/// One team's messages, oldest first, keeping the last `limit`.
///
/// Messages without a timestamp sort before everything else.
pub fn team_feed(all: &AllInboxes, team: &str, limit: usize) -> Vec<FeedItem> {
    let Some(inboxes) = all.get(team) else {
        return Vec::new();
    };
    let mut items: Vec<FeedItem> = team_items(team, inboxes).collect();
    items.sort_by_key(|item| item.timestamp);
    let skip = items.len().saturating_sub(limit);
    items.split_off(skip)
}

/// Case-insensitive search across every team, newest first.
///
/// Matches the raw text, the rendered text, the sender and the summary.
/// Messages without a timestamp come last. A blank query matches nothing.
pub fn search(all: &AllInboxes, query: &str) -> Vec<FeedItem> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let mut hits: Vec<FeedItem> = all
        .iter()
        .flat_map(|(team, inboxes)| team_items(team, inboxes))
        .filter(|item| item.matches(&needle))
        .collect();
    hits.sort_by(|a, b| match (a.timestamp, b.timestamp) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    hits
}

/// Keep items of one category; `None` keeps everything
pub fn filter_by_category(items: &[FeedItem], category: Option<Category>) -> Vec<FeedItem> {
    items
        .iter()
        .filter(|item| category.map_or(true, |c| item.category == c))
        .cloned()
        .collect()
}

/// Team names from the roster, then any extra inbox keys, without duplicates
pub fn team_names(teams: &[Team], all: &AllInboxes) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in teams.iter().map(|t| &t.name).chain(all.keys()) {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// Unread messages per team
pub fn unread_count(all: &AllInboxes, team: &str) -> usize {
    all.get(team).map_or(0, |inboxes| {
        inboxes
            .values()
            .flat_map(|inbox| &inbox.messages)
            .filter(|m| !m.read)
            .count()
    })
}
