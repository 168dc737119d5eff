//! Main TUI application state and logic

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::widgets::TableState;
use tracing::debug;

use crate::classify::Category;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{self, FeedItem};
use crate::live::{DashboardState, LiveClient};
use crate::notify::{desktop, InboxWatcher, NotificationCenter, NotificationDraft, RawMessageWatcher};

/// Active view/tab in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    /// Stats and team cards
    #[default]
    Overview,
    /// Selected team's task table
    Tasks,
    /// Message feed and search
    Messages,
    /// Captured agent outputs
    Outputs,
    /// Finished teams
    History,
    /// Notification center
    Notifications,
}

impl ActiveTab {
    /// Tabs in display order
    pub const ALL: [ActiveTab; 6] = [
        Self::Overview,
        Self::Tasks,
        Self::Messages,
        Self::Outputs,
        Self::History,
        Self::Notifications,
    ];

    /// Tab label
    pub fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Tasks => "Tasks",
            Self::Messages => "Messages",
            Self::Outputs => "Outputs",
            Self::History => "History",
            Self::Notifications => "Alerts",
        }
    }

    /// Position in [`ActiveTab::ALL`]
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Following tab, wrapping
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Preceding tab, wrapping
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Main TUI application state
pub struct App {
    /// Set to leave the run loop
    pub should_quit: bool,
    /// Tab being shown
    pub active_tab: ActiveTab,
    /// Latest published dashboard state
    pub state: DashboardState,
    /// Stored notifications
    pub notifications: NotificationCenter,
    /// Index into [`App::team_names`]
    pub selected_team: usize,
    /// Category shown in the Messages tab, `None` for all
    pub category_filter: Option<Category>,
    /// Cross-team search text
    pub search_query: String,
    /// Keys go to the search box
    pub search_focused: bool,
    /// Selection in the Tasks table
    pub tasks_state: TableState,
    /// Selection in the Messages table
    pub messages_state: TableState,
    /// Selection in the Outputs table
    pub outputs_state: TableState,
    /// Selection in the History table
    pub history_state: TableState,
    /// Selection in the notification list
    pub notifications_state: TableState,
    /// Help overlay visible
    pub show_help: bool,
    /// Status bar text and when it was set
    pub status_message: Option<(String, Instant)>,
    /// When the last state change arrived
    pub last_update: Option<Instant>,
    /// Redraw tick
    pub refresh_rate: Duration,
    /// Messages shown per team
    pub max_feed_items: usize,
    /// Server shown in the header
    pub server_url: String,
    desktop: bool,
    raw_watcher: RawMessageWatcher,
    inbox_watcher: InboxWatcher,
    seen_revision: u64,
}

impl App {
    /// App on the Overview tab with no state yet
    pub fn new(config: &Config, notifications: NotificationCenter) -> Self {
        Self {
            should_quit: false,
            active_tab: ActiveTab::default(),
            state: DashboardState::default(),
            notifications,
            selected_team: 0,
            category_filter: None,
            search_query: String::new(),
            search_focused: false,
            tasks_state: TableState::default(),
            messages_state: TableState::default(),
            outputs_state: TableState::default(),
            history_state: TableState::default(),
            notifications_state: TableState::default(),
            show_help: false,
            status_message: None,
            last_update: None,
            refresh_rate: Duration::from_millis(config.tui.refresh_rate_ms),
            max_feed_items: config.tui.max_feed_items,
            server_url: config.server.url.clone(),
            desktop: config.notifications.desktop,
            raw_watcher: RawMessageWatcher::new(),
            inbox_watcher: InboxWatcher::new(),
            seen_revision: 0,
        }
    }

    /// Take a newly published state, raising notifications for what changed
    pub fn apply_state(&mut self, state: DashboardState) {
        if state.revision != self.seen_revision {
            self.seen_revision = state.revision;
            self.last_update = Some(Instant::now());

            if let Some(raw) = &state.last_raw_message {
                if let Some(draft) = self.raw_watcher.observe(raw) {
                    self.notify(draft);
                }
            }
            for alert in self.inbox_watcher.observe(&state.snapshot.all_inboxes) {
                self.notify(alert.into_draft());
            }
        }

        self.state = state;
        let teams = self.team_names().len();
        if self.selected_team >= teams {
            self.selected_team = teams.saturating_sub(1);
        }
    }

    fn notify(&mut self, draft: NotificationDraft) {
        if self.desktop {
            desktop::show(&draft.title, &draft.message);
        }
        let added = self.notifications.add(draft);
        debug!(kind = added.kind.as_str(), title = %added.title, "Notification added");
    }

    /// Active teams first, then teams known only from inboxes
    pub fn team_names(&self) -> Vec<String> {
        feed::team_names(&self.state.snapshot.teams, &self.state.snapshot.all_inboxes)
    }

    /// Name of the selected team
    pub fn selected_team_name(&self) -> Option<String> {
        self.team_names().into_iter().nth(self.selected_team)
    }

    /// Feed for the Messages tab: search results when a query is set,
    /// otherwise the selected team's recent messages
    pub fn messages(&self) -> Vec<FeedItem> {
        let all = &self.state.snapshot.all_inboxes;
        let items = if self.search_query.trim().is_empty() {
            self.selected_team_name()
                .map(|team| feed::team_feed(all, &team, self.max_feed_items))
                .unwrap_or_default()
        } else {
            feed::search(all, &self.search_query)
        };
        feed::filter_by_category(&items, self.category_filter)
    }

    /// Step the category filter through every category, then back to all
    pub fn cycle_category(&mut self) {
        self.category_filter = match self.category_filter {
            None => Some(Category::ALL[0]),
            Some(current) => Category::ALL
                .iter()
                .position(|c| *c == current)
                .and_then(|i| Category::ALL.get(i + 1))
                .copied(),
        };
        self.messages_state.select(None);
        let label = self.category_filter.map_or("all", Category::as_str);
        self.set_status(format!("Category: {label}"));
    }

    fn switch_team(&mut self, forward: bool) {
        let count = self.team_names().len();
        if count == 0 {
            return;
        }
        self.selected_team = if forward {
            (self.selected_team + 1) % count
        } else {
            (self.selected_team + count - 1) % count
        };
        self.tasks_state.select(None);
        self.messages_state.select(None);
        if let Some(team) = self.selected_team_name() {
            self.set_status(format!("Team: {team}"));
        }
    }

    /// Handle key events
    pub fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.search_focused {
            self.handle_search_key(code, modifiers);
            return;
        }

        match (code, modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Char('?'), _) => self.show_help = !self.show_help,
            (KeyCode::Esc, _) => {
                if self.show_help {
                    self.show_help = false;
                } else if !self.search_query.is_empty() {
                    self.search_query.clear();
                    self.messages_state.select(None);
                }
            }
            (KeyCode::Tab, KeyModifiers::NONE) => self.active_tab = self.active_tab.next(),
            (KeyCode::BackTab, _) => self.active_tab = self.active_tab.prev(),
            (KeyCode::Char(digit @ '1'..='6'), KeyModifiers::NONE) => {
                let index = digit as usize - '1' as usize;
                self.active_tab = ActiveTab::ALL[index];
            }
            (KeyCode::Char('/'), KeyModifiers::NONE) => {
                self.active_tab = ActiveTab::Messages;
                self.search_focused = true;
            }
            (KeyCode::Char('c'), KeyModifiers::NONE) => self.cycle_category(),
            (KeyCode::Char(']'), _) => self.switch_team(true),
            (KeyCode::Char('['), _) => self.switch_team(false),
            (KeyCode::Char('r'), KeyModifiers::NONE) => {
                self.notifications.mark_all_read();
                self.set_status("All notifications marked read".to_string());
            }
            (KeyCode::Char('x'), KeyModifiers::NONE) if self.active_tab == ActiveTab::Notifications => {
                self.notifications.clear_all();
                self.notifications_state.select(None);
            }
            (KeyCode::Enter, _) if self.active_tab == ActiveTab::Notifications => {
                let id = self
                    .notifications_state
                    .selected()
                    .and_then(|i| self.notifications.items().get(i))
                    .map(|n| n.id.clone());
                if let Some(id) = id {
                    self.notifications.mark_as_read(&id);
                }
            }
            (KeyCode::Up | KeyCode::Char('k'), _) => self.move_selection(-1),
            (KeyCode::Down | KeyCode::Char('j'), _) => self.move_selection(1),
            (KeyCode::Home | KeyCode::Char('g'), _) => self.move_selection(isize::MIN),
            (KeyCode::End | KeyCode::Char('G'), _) => self.move_selection(isize::MAX),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        match (code, modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.should_quit = true,
            (KeyCode::Esc, _) => {
                self.search_focused = false;
                self.search_query.clear();
            }
            (KeyCode::Enter, _) => {
                self.search_focused = false;
                let hits = self.messages().len();
                self.set_status(format!("{hits} message(s) match \"{}\"", self.search_query));
            }
            (KeyCode::Backspace, _) => {
                self.search_query.pop();
            }
            (KeyCode::Char(c), _) => self.search_query.push(c),
            _ => {}
        }
        self.messages_state.select(None);
    }

    /// Row count and table state of the list on the active tab
    fn active_list(&mut self) -> Option<(usize, &mut TableState)> {
        let len = match self.active_tab {
            ActiveTab::Overview => return None,
            ActiveTab::Tasks => self
                .selected_team_name()
                .and_then(|name| self.state.snapshot.team(&name).map(|t| t.tasks.len()))
                .unwrap_or(0),
            ActiveTab::Messages => self.messages().len(),
            ActiveTab::Outputs => self.state.snapshot.agent_outputs.len(),
            ActiveTab::History => self.state.snapshot.team_history.len(),
            ActiveTab::Notifications => self.notifications.len(),
        };
        let state = match self.active_tab {
            ActiveTab::Overview | ActiveTab::Tasks => &mut self.tasks_state,
            ActiveTab::Messages => &mut self.messages_state,
            ActiveTab::Outputs => &mut self.outputs_state,
            ActiveTab::History => &mut self.history_state,
            ActiveTab::Notifications => &mut self.notifications_state,
        };
        Some((len, state))
    }

    fn move_selection(&mut self, delta: isize) {
        let Some((len, state)) = self.active_list() else {
            return;
        };
        if len == 0 {
            state.select(None);
            return;
        }
        let current = state.selected().unwrap_or(0) as isize;
        let next = current.saturating_add(delta).clamp(0, len as isize - 1);
        state.select(Some(next as usize));
    }

    /// Set a status message that expires after 3 seconds
    pub fn set_status(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Status message while it has not expired
    pub fn get_status(&self) -> Option<&str> {
        self.status_message.as_ref().and_then(|(msg, time)| {
            if time.elapsed() < Duration::from_secs(3) {
                Some(msg.as_str())
            } else {
                None
            }
        })
    }

    /// Run the TUI until the user quits
    pub async fn run(&mut self, live: &LiveClient) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        };
        use ratatui::{backend::CrosstermBackend, Terminal};
        use std::io;

        let tui_err = |e: io::Error| Error::tui(e.to_string());

        enable_raw_mode().map_err(tui_err)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(tui_err)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(tui_err)?;

        let mut events = super::EventHandler::new(self.refresh_rate.as_millis() as u64);
        events.start();
        let state_rx = live.subscribe();
        events.watch_state(state_rx.clone());
        self.apply_state(state_rx.borrow().clone());

        let result = self.event_loop(&mut terminal, &mut events, &state_rx).await;

        disable_raw_mode().map_err(tui_err)?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen).map_err(tui_err)?;
        terminal.show_cursor().map_err(tui_err)?;

        result
    }

    async fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut ratatui::Terminal<B>,
        events: &mut super::EventHandler,
        state_rx: &tokio::sync::watch::Receiver<DashboardState>,
    ) -> Result<()> {
        while !self.should_quit {
            terminal
                .draw(|frame| super::ui::draw(frame, self))
                .map_err(|e| Error::tui(e.to_string()))?;

            match events.next().await {
                Some(super::Event::Key(key)) => self.handle_key(key.code, key.modifiers),
                Some(super::Event::StateChanged) => {
                    let state = state_rx.borrow().clone();
                    self.apply_state(state);
                }
                Some(super::Event::Tick | super::Event::Resize(..)) => {}
                None => break,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::decode;
    use serde_json::json;

    fn app() -> App {
        App::new(&Config::default(), NotificationCenter::new(10))
    }

    fn state_from(messages: &[serde_json::Value]) -> DashboardState {
        let mut state = DashboardState::default();
        for m in messages {
            state.apply(decode(&m.to_string()).unwrap());
        }
        state
    }

    fn key(app: &mut App, code: KeyCode) {
        app.handle_key(code, KeyModifiers::NONE);
    }

    #[test]
    fn test_tab_navigation() {
        let mut app = app();
        key(&mut app, KeyCode::Tab);
        assert_eq!(app.active_tab, ActiveTab::Tasks);
        app.handle_key(KeyCode::BackTab, KeyModifiers::SHIFT);
        app.handle_key(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(app.active_tab, ActiveTab::Notifications);
        key(&mut app, KeyCode::Char('5'));
        assert_eq!(app.active_tab, ActiveTab::History);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        key(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = self::app();
        app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn test_search_captures_typing() {
        let mut app = app();
        key(&mut app, KeyCode::Char('/'));
        assert_eq!(app.active_tab, ActiveTab::Messages);
        for c in "qa".chars() {
            key(&mut app, KeyCode::Char(c));
        }
        assert!(!app.should_quit);
        assert_eq!(app.search_query, "qa");
        key(&mut app, KeyCode::Backspace);
        key(&mut app, KeyCode::Enter);
        assert!(!app.search_focused);
        assert_eq!(app.search_query, "q");
        key(&mut app, KeyCode::Esc);
        assert!(app.search_query.is_empty());
    }

    #[test]
    fn test_category_cycle_wraps_to_all() {
        let mut app = app();
        for expected in Category::ALL {
            key(&mut app, KeyCode::Char('c'));
            assert_eq!(app.category_filter, Some(expected));
        }
        key(&mut app, KeyCode::Char('c'));
        assert_eq!(app.category_filter, None);
    }

    #[test]
    fn test_team_switching_wraps() {
        let mut app = app();
        app.apply_state(state_from(&[json!({
            "data": [{"name": "alpha"}, {"name": "beta"}],
            "allInboxes": {"gamma": {}}
        })]));
        assert_eq!(app.selected_team_name().as_deref(), Some("alpha"));
        key(&mut app, KeyCode::Char('['));
        assert_eq!(app.selected_team_name().as_deref(), Some("gamma"));
        key(&mut app, KeyCode::Char(']'));
        key(&mut app, KeyCode::Char(']'));
        assert_eq!(app.selected_team_name().as_deref(), Some("beta"));
    }

    #[test]
    fn test_messages_follow_team_and_filter() {
        let mut app = app();
        app.apply_state(state_from(&[json!({
            "data": [{"name": "alpha"}],
            "allInboxes": {"alpha": {"worker": {"messages": [
                {"from": "lead", "text": "Can you check the build?", "timestamp": "2026-02-18T10:00:00Z"},
                {"from": "lead", "text": "{\"type\":\"task_completed\",\"taskSubject\":\"Build\"}", "timestamp": "2026-02-18T10:01:00Z"}
            ]}}}
        })]));
        assert_eq!(app.messages().len(), 2);

        app.category_filter = Some(Category::Completion);
        let filtered = app.messages();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "✅ Completed: Build");
    }

    #[test]
    fn test_new_updates_raise_notifications() {
        let mut app = app();
        let first = json!({"type": "teams_update", "timestamp": "1", "data": [{"name": "alpha"}],
            "allInboxes": {"alpha": {"worker": {"messages": [{"from": "lead", "text": "hi"}]}}}});
        app.apply_state(state_from(&[first.clone()]));
        assert!(app.notifications.is_empty());

        let second = json!({"type": "inbox_update", "timestamp": "2", "teamName": "alpha",
            "inboxes": {"worker": {"messages": [{"from": "lead", "text": "hi"}, {"from": "lead", "text": "next task"}]}}});
        app.apply_state(state_from(&[first, second]));

        let titles: Vec<&str> = app.notifications.items().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["lead → worker", "New message"]);

        key(&mut app, KeyCode::Char('r'));
        assert_eq!(app.notifications.unread_count(), 0);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut app = app();
        app.apply_state(state_from(&[json!({"agentOutputs": [{"content": "a"}, {"content": "b"}]})]));
        key(&mut app, KeyCode::Char('4'));
        for _ in 0..5 {
            key(&mut app, KeyCode::Char('j'));
        }
        assert_eq!(app.outputs_state.selected(), Some(1));
        key(&mut app, KeyCode::Char('g'));
        assert_eq!(app.outputs_state.selected(), Some(0));
    }
}
