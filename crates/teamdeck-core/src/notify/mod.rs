//! Notification center
//!
//! Keeps a bounded, newest-first list of notifications persisted as JSON.
//! [`RawMessageWatcher`] and [`InboxWatcher`] produce drafts from dashboard
//! changes; [`desktop::show`] mirrors them to the desktop when enabled.

pub mod desktop;
mod watch;

pub use watch::{InboxAlert, InboxWatcher, RawMessageWatcher};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// Default cap on stored notifications
pub const DEFAULT_MAX_STORED: usize = 100;

/// Kind of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Team roster changes
    Team,
    /// Task list changes
    Task,
    /// Inbox messages
    Message,
    /// Agent output captures
    Output,
    /// Connection and client events
    System,
    /// Anything else
    #[default]
    Info,
}

impl NotificationKind {
    /// Lowercase name as stored
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Task => "task",
            Self::Message => "message",
            Self::Output => "output",
            Self::System => "system",
            Self::Info => "info",
        }
    }
}

/// A notification before it is stored
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationDraft {
    /// `None` stores as [`NotificationKind::Info`]
    pub kind: Option<NotificationKind>,
    /// Headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Team the notification is about
    pub team: Option<String>,
}

impl NotificationDraft {
    /// Draft of the given kind with no team
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            title: title.into(),
            message: message.into(),
            team: None,
        }
    }

    /// Attach a team
    pub fn with_team(mut self, team: Option<String>) -> Self {
        self.team = team;
        self
    }
}

/// A stored notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Notification {
    /// Random v4 UUID
    pub id: String,
    /// Kind, stored as `type`
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Read flag
    pub read: bool,
    /// When it was added
    pub timestamp: DateTime<Utc>,
    /// Team the notification is about
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// Age bucket used when listing notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationGroup {
    /// Under a minute old
    JustNow,
    /// Under a day old
    Today,
    /// A day or older
    Earlier,
}

impl NotificationGroup {
    /// Bucket for `timestamp` as seen at `now`
    pub fn of(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let age = now - timestamp;
        if age < Duration::minutes(1) {
            Self::JustNow
        } else if age < Duration::days(1) {
            Self::Today
        } else {
            Self::Earlier
        }
    }

    /// Section heading
    pub fn label(self) -> &'static str {
        match self {
            Self::JustNow => "Just Now",
            Self::Today => "Today",
            Self::Earlier => "Earlier",
        }
    }
}

/// Bounded notification list with optional JSON persistence
#[derive(Debug)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    max_stored: usize,
    store_path: Option<PathBuf>,
}

impl NotificationCenter {
    /// In-memory center
    pub fn new(max_stored: usize) -> Self {
        Self {
            items: Vec::new(),
            max_stored: max_stored.max(1),
            store_path: None,
        }
    }

    /// Center backed by a JSON file, loading what is already there
    pub fn with_store(path: impl Into<PathBuf>, max_stored: usize) -> Self {
        let path = path.into();
        let mut items = load_store(&path);
        items.truncate(max_stored.max(1));
        debug!(path = %path.display(), count = items.len(), "Loaded notifications");
        Self {
            items,
            max_stored: max_stored.max(1),
            store_path: Some(path),
        }
    }

    /// Store a new notification at the front and return it
    pub fn add(&mut self, draft: NotificationDraft) -> &Notification {
        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            kind: draft.kind.unwrap_or_default(),
            title: draft.title,
            message: draft.message,
            read: false,
            timestamp: Utc::now(),
            team: draft.team,
        };
        self.items.insert(0, notification);
        self.items.truncate(self.max_stored);
        self.persist();
        &self.items[0]
    }

    /// Returns false when no notification has that id
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        let Some(item) = self.items.iter_mut().find(|n| n.id == id) else {
            return false;
        };
        item.read = true;
        self.persist();
        true
    }

    /// Mark every notification read
    pub fn mark_all_read(&mut self) {
        for item in &mut self.items {
            item.read = true;
        }
        self.persist();
    }

    /// Remove every notification
    pub fn clear_all(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Notifications not yet read
    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    /// Newest first
    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Number stored
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn persist(&self) {
        if let Some(path) = &self.store_path {
            if let Err(e) = save_store(path, &self.items) {
                warn!(path = %path.display(), error = %e, "Failed to save notifications");
            }
        }
    }
}

/// Read stored notifications; unreadable or malformed stores load as empty
fn load_store(path: &Path) -> Vec<Notification> {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Notification>>(&raw) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable notification store");
            Vec::new()
        }
    }
}

fn save_store(path: &Path, items: &[Notification]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string(items)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn titled(title: &str) -> NotificationDraft {
        NotificationDraft {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_prepends_with_defaults() {
        let mut center = NotificationCenter::new(DEFAULT_MAX_STORED);
        center.add(titled("First"));
        let id = center.add(titled("Second")).id.clone();

        assert_eq!(center.items()[0].title, "Second");
        assert_eq!(center.items()[1].title, "First");
        assert_eq!(center.items()[0].kind, NotificationKind::Info);
        assert!(!center.items()[0].read);
        assert_ne!(center.items()[0].id, center.items()[1].id);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_read_tracking() {
        let mut center = NotificationCenter::new(DEFAULT_MAX_STORED);
        let first = center.add(titled("A")).id.clone();
        center.add(titled("B"));
        assert_eq!(center.unread_count(), 2);

        assert!(center.mark_as_read(&first));
        assert!(!center.mark_as_read("missing"));
        assert_eq!(center.unread_count(), 1);

        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
        assert!(center.items().iter().all(|n| n.read));

        center.clear_all();
        assert!(center.is_empty());
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut center = NotificationCenter::new(3);
        for i in 0..5 {
            center.add(titled(&format!("n{i}")));
        }
        let titles: Vec<&str> = center.items().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["n4", "n3", "n2"]);
    }

    #[test]
    fn test_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state/notifications.json");

        let mut center = NotificationCenter::with_store(&path, DEFAULT_MAX_STORED);
        center.add(NotificationDraft::new(NotificationKind::Task, "Persisted", "saved").with_team(Some("alpha".into())));

        let reloaded = NotificationCenter::with_store(&path, DEFAULT_MAX_STORED);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.items()[0].title, "Persisted");
        assert_eq!(reloaded.items()[0].kind, NotificationKind::Task);
        assert_eq!(reloaded.items()[0].team.as_deref(), Some("alpha"));
    }

    #[test]
    fn test_loads_existing_store_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notifications.json");
        std::fs::write(
            &path,
            r#"[{"id":"1","type":"info","title":"Test","message":"Hello","read":false,"timestamp":"2024-01-01T00:00:00Z","tab":null}]"#,
        )
        .unwrap();
        let center = NotificationCenter::with_store(&path, DEFAULT_MAX_STORED);
        assert_eq!(center.items()[0].title, "Test");
    }

    #[test]
    fn test_corrupt_store_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notifications.json");

        std::fs::write(&path, "not-json").unwrap();
        assert!(NotificationCenter::with_store(&path, 10).is_empty());

        std::fs::write(&path, r#"{"foo":"bar"}"#).unwrap();
        assert!(NotificationCenter::with_store(&path, 10).is_empty());
    }

    #[test]
    fn test_groups_by_age() {
        let now = Utc::now();
        assert_eq!(NotificationGroup::of(now, now), NotificationGroup::JustNow);
        assert_eq!(NotificationGroup::of(now - Duration::hours(2), now), NotificationGroup::Today);
        assert_eq!(NotificationGroup::of(now - Duration::days(2), now), NotificationGroup::Earlier);
    }
}
