//! Watchers that turn dashboard changes into notifications

use std::collections::HashMap;

use serde_json::Value;

use super::{NotificationDraft, NotificationKind};
use crate::classify::{to_natural, Classification};
use crate::models::AllInboxes;

/// Characters of message text used when there is no summary
const ALERT_BODY_CHARS: usize = 100;

/// Notifies on each new raw update, skipping the initial load and repeats
#[derive(Debug, Default)]
pub struct RawMessageWatcher {
    initialized: bool,
    last_fingerprint: Option<String>,
}

impl RawMessageWatcher {
    /// Watcher that has not seen a message yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the latest raw message; returns a notification for new ones
    pub fn observe(&mut self, raw: &Value) -> Option<NotificationDraft> {
        let fingerprint = fingerprint(raw);
        if !self.initialized {
            self.initialized = true;
            self.last_fingerprint = Some(fingerprint);
            return None;
        }
        if self.last_fingerprint.as_deref() == Some(fingerprint.as_str()) {
            return None;
        }
        self.last_fingerprint = Some(fingerprint);
        Some(draft_for(raw))
    }
}

/// `type` + `timestamp`, the identity of a pushed message
fn fingerprint(raw: &Value) -> String {
    let part = |key: &str| match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };
    format!("{}:{}", part("type"), part("timestamp"))
}

fn draft_for(raw: &Value) -> NotificationDraft {
    let team = raw
        .get("teamName")
        .and_then(Value::as_str)
        .map(str::to_string);
    let explicit = raw.get("message").and_then(Value::as_str);

    match raw.get("type").and_then(Value::as_str) {
        Some("teams_update" | "initial_data") => {
            let message = match raw.get("data").and_then(Value::as_array) {
                Some(teams) if teams.len() == 1 => "1 active team".to_string(),
                Some(teams) => format!("{} active teams", teams.len()),
                None => "Team roster changed".to_string(),
            };
            NotificationDraft::new(NotificationKind::Team, "Teams updated", message)
        }
        Some("task_update") => NotificationDraft::new(
            NotificationKind::Task,
            "Task updated",
            explicit.map_or_else(
                || match &team {
                    Some(t) => format!("Tasks changed in {t}"),
                    None => "Task list changed".to_string(),
                },
                str::to_string,
            ),
        ),
        Some("inbox_update") => NotificationDraft::new(
            NotificationKind::Message,
            "New message",
            match &team {
                Some(t) => format!("Inbox activity in {t}"),
                None => "Inbox activity".to_string(),
            },
        ),
        Some(other) => NotificationDraft::new(
            NotificationKind::Info,
            "Update received",
            explicit.unwrap_or(other).to_string(),
        ),
        None => NotificationDraft::new(NotificationKind::Info, "Update received", "Dashboard data refreshed"),
    }
    .with_team(team)
}

/// A new message landed in an agent's inbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxAlert {
    /// Team owning the inbox
    pub team: String,
    /// Recipient
    pub agent: String,
    /// Sender, `unknown` when missing
    pub from: String,
    /// Summary, or the start of the text
    pub body: String,
    /// Full message text as sent
    pub text: String,
    /// Sender-provided summary
    pub summary: Option<String>,
}

impl InboxAlert {
    /// `sender → recipient`
    pub fn title(&self) -> String {
        format!("{} → {}", self.from, self.agent)
    }

    /// Display line and category, preferring a usable summary
    pub fn classification(&self) -> Classification {
        to_natural(&self.text, self.summary.as_deref())
    }

    /// Notification for the alert, titled `sender → recipient`
    pub fn into_draft(self) -> NotificationDraft {
        let title = self.title();
        NotificationDraft::new(NotificationKind::Message, title, self.body).with_team(Some(self.team))
    }
}

/// Tracks per-inbox message counts to spot new arrivals
#[derive(Debug, Default)]
pub struct InboxWatcher {
    seen: HashMap<String, usize>,
}

impl InboxWatcher {
    /// Watcher with no inbox sizes recorded
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare against the last observation.
    ///
    /// An inbox seen for the first time only records its size.
    pub fn observe(&mut self, all: &AllInboxes) -> Vec<InboxAlert> {
        let mut alerts = Vec::new();
        for (team, inboxes) in all {
            for (agent, inbox) in inboxes {
                let key = format!("{team}/{agent}");
                let current = inbox.messages.len();
                let seen = self.seen.get(&key).copied().unwrap_or(current);

                if current > seen {
                    alerts.extend(inbox.messages[seen..].iter().map(|m| InboxAlert {
                        team: team.clone(),
                        agent: agent.clone(),
                        from: m.from.clone().unwrap_or_else(|| "unknown".to_string()),
                        body: m
                            .summary
                            .clone()
                            .filter(|s| !s.is_empty())
                            .unwrap_or_else(|| cut(&m.text, ALERT_BODY_CHARS)),
                        text: m.text.clone(),
                        summary: m.summary.clone(),
                    }));
                }
                self.seen.insert(key, current);
            }
        }
        alerts
    }
}

fn cut(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentInbox, InboxMessage, TeamInboxes};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_first_raw_message_is_skipped() {
        let mut watcher = RawMessageWatcher::new();
        let first = json!({"type": "teams_update", "data": [{"name": "Alpha"}], "timestamp": "1"});
        assert_eq!(watcher.observe(&first), None);
    }

    #[test]
    fn test_second_message_notifies() {
        let mut watcher = RawMessageWatcher::new();
        watcher.observe(&json!({"type": "teams_update", "data": [{"name": "Alpha"}], "timestamp": "1"}));
        let draft = watcher
            .observe(&json!({"type": "teams_update", "data": [{"name": "Beta"}], "timestamp": "2"}))
            .unwrap();
        assert_eq!(draft.kind, Some(NotificationKind::Team));
        assert_eq!(draft.message, "1 active team");
    }

    #[test]
    fn test_same_fingerprint_is_deduplicated() {
        let mut watcher = RawMessageWatcher::new();
        watcher.observe(&json!({"type": "teams_update", "timestamp": "1"}));
        assert!(watcher.observe(&json!({"type": "teams_update", "timestamp": "2", "data": []})).is_some());
        assert!(watcher.observe(&json!({"type": "teams_update", "timestamp": "2", "data": [1]})).is_none());
    }

    #[test]
    fn test_kind_mapping() {
        let kinds: Vec<Option<NotificationKind>> = ["initial_data", "task_update", "inbox_update", "heartbeat"]
            .iter()
            .enumerate()
            .map(|(i, kind)| {
                let mut watcher = RawMessageWatcher::new();
                watcher.observe(&json!({"type": "seed"}));
                watcher
                    .observe(&json!({"type": kind, "timestamp": i, "teamName": "alpha"}))
                    .and_then(|d| d.kind)
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(NotificationKind::Team),
                Some(NotificationKind::Task),
                Some(NotificationKind::Message),
                Some(NotificationKind::Info),
            ]
        );
    }

    fn all_with(messages: Vec<InboxMessage>) -> AllInboxes {
        let mut team = TeamInboxes::new();
        team.insert("worker".into(), AgentInbox { messages });
        let mut all = AllInboxes::new();
        all.insert("alpha".into(), team);
        all
    }

    fn msg(text: &str, summary: Option<&str>) -> InboxMessage {
        InboxMessage {
            from: Some("lead".into()),
            text: text.into(),
            summary: summary.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_inbox_watcher_initializes_silently() {
        let mut watcher = InboxWatcher::new();
        assert!(watcher.observe(&all_with(vec![msg("a", None), msg("b", None)])).is_empty());
    }

    #[test]
    fn test_inbox_watcher_reports_each_new_message() {
        let mut watcher = InboxWatcher::new();
        watcher.observe(&all_with(vec![msg("a", None)]));

        let long = "y".repeat(150);
        let alerts = watcher.observe(&all_with(vec![
            msg("a", None),
            msg("b", Some("Short summary")),
            msg(&long, None),
        ]));

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].body, "Short summary");
        assert_eq!(alerts[0].title(), "lead → worker");
        assert_eq!(alerts[1].body, "y".repeat(100));
        assert_eq!(alerts[1].team, "alpha");

        // no change, no alerts
        assert!(watcher
            .observe(&all_with(vec![msg("a", None), msg("b", None), msg(&long, None)]))
            .is_empty());
    }

    #[test]
    fn test_alert_classification_prefers_summary() {
        let mut watcher = InboxWatcher::new();
        watcher.observe(&all_with(vec![]));

        let envelope = r#"{"type":"task_completed","taskSubject":"Write parser"}"#;
        let alerts = watcher.observe(&all_with(vec![
            msg(envelope, Some("Parser landed")),
            msg(envelope, None),
        ]));

        assert_eq!(alerts[0].summary.as_deref(), Some("Parser landed"));
        assert_eq!(alerts[0].classification().text, "Parser landed");
        assert_eq!(alerts[1].summary, None);
        assert_eq!(alerts[1].classification().text, "✅ Completed: Write parser");
    }

    #[test]
    fn test_inbox_watcher_handles_shrinking_inbox() {
        let mut watcher = InboxWatcher::new();
        watcher.observe(&all_with(vec![msg("a", None), msg("b", None)]));
        assert!(watcher.observe(&all_with(vec![])).is_empty());
        let alerts = watcher.observe(&all_with(vec![msg("c", None)]));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].body, "c");
    }
}
