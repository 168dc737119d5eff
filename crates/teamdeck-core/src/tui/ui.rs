//! UI rendering for the TUI

use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use super::app::{ActiveTab, App};
use super::components::{category_color, connection_badge, notification_color, ProgressBar, StatCard};
use crate::format::{agent_color, agent_initials, relative_time, relative_to};
use crate::models::{DashboardStats, TaskCounts, TaskStatus};
use crate::notify::NotificationGroup;

/// Main colors
const PRIMARY: Color = Color::Cyan;
const SECONDARY: Color = Color::Magenta;
const SUCCESS: Color = Color::Green;
const WARNING: Color = Color::Yellow;
const ERROR: Color = Color::Red;
const MUTED: Color = Color::DarkGray;

/// Draw the entire UI
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header + tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.size());

    draw_header(frame, app, chunks[0]);
    draw_content(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn bordered(title: impl Into<String>) -> Block<'static> {
    Block::default()
        .title(title.into())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MUTED))
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(14),
            Constraint::Min(40),
            Constraint::Length(26),
        ])
        .split(area);

    let logo = Paragraph::new("▣ TeamDeck").style(Style::default().fg(PRIMARY).bold());
    frame.render_widget(logo, chunks[0]);

    let unread = app.notifications.unread_count();
    let tab_titles: Vec<Line> = ActiveTab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| {
            let style = if *tab == app.active_tab {
                Style::default().fg(PRIMARY).bold()
            } else {
                Style::default().fg(MUTED)
            };
            let title = if *tab == ActiveTab::Notifications && unread > 0 {
                format!(" {} {} ({unread}) ", i + 1, tab.title())
            } else {
                format!(" {} {} ", i + 1, tab.title())
            };
            Line::from(title).style(style)
        })
        .collect();

    let tabs = Tabs::new(tab_titles)
        .select(app.active_tab.index())
        .highlight_style(Style::default().fg(PRIMARY))
        .divider(symbols::line::VERTICAL);
    frame.render_widget(tabs, chunks[1]);

    let state = &app.state;
    let mut lines = vec![Line::from(connection_badge(
        state.phase,
        state.status_label(),
        state.reconnect_attempts,
    ))];
    if let (false, Some(err)) = (state.is_connected, &state.last_error) {
        lines.push(Line::from(truncate(err, 26)).style(Style::default().fg(ERROR)));
    }
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Right), chunks[2]);
}

fn draw_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.active_tab {
        ActiveTab::Overview => draw_overview(frame, app, area),
        ActiveTab::Tasks => draw_tasks(frame, app, area),
        ActiveTab::Messages => draw_messages(frame, app, area),
        ActiveTab::Outputs => draw_outputs(frame, app, area),
        ActiveTab::History => draw_history(frame, app, area),
        ActiveTab::Notifications => draw_notifications(frame, app, area),
    }
}

/// Stats from the server, or derived from the roster before any arrive
fn stats(app: &App) -> DashboardStats {
    let snapshot = &app.state.snapshot;
    snapshot.stats.unwrap_or_else(|| {
        let counts = snapshot
            .teams
            .iter()
            .map(|t| t.task_counts())
            .fold(TaskCounts::default(), |mut acc, c| {
                acc.total += c.total;
                acc.completed += c.completed;
                acc.in_progress += c.in_progress;
                acc.blocked += c.blocked;
                acc
            });
        DashboardStats {
            total_teams: snapshot.teams.len() as u64,
            total_agents: snapshot.teams.iter().map(|t| t.members.len() as u64).sum(),
            total_tasks: counts.total as u64,
            in_progress_tasks: counts.in_progress as u64,
            completed_tasks: counts.completed as u64,
            blocked_tasks: counts.blocked as u64,
        }
    })
}

fn draw_overview(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(area);

    let stats = stats(app);
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 6); 6])
        .split(chunks[0]);
    let values = [
        ("Teams", stats.total_teams, PRIMARY),
        ("Agents", stats.total_agents, SECONDARY),
        ("Tasks", stats.total_tasks, Color::White),
        ("In Progress", stats.in_progress_tasks, WARNING),
        ("Completed", stats.completed_tasks, SUCCESS),
        ("Blocked", stats.blocked_tasks, if stats.blocked_tasks > 0 { ERROR } else { MUTED }),
    ];
    for (i, (title, value, color)) in values.into_iter().enumerate() {
        StatCard::new(title, value.to_string())
            .color(color)
            .render(frame, cards[i]);
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_team_table(frame, app, bottom[0]);
    draw_recent_activity(frame, app, bottom[1]);
}

fn draw_team_table(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Team", "Members", "Progress", "Done", "Blocked"])
        .style(Style::default().fg(PRIMARY).bold());

    let selected = app.selected_team_name();
    let rows: Vec<Row> = app
        .state
        .snapshot
        .teams
        .iter()
        .map(|team| {
            let counts = team.task_counts();
            let bar = ProgressBar::new(counts.completed as f64, counts.total as f64).render_inline(10);
            let name_style = if selected.as_deref() == Some(team.name.as_str()) {
                Style::default().fg(PRIMARY).bold()
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(truncate(&team.name, 24)).style(name_style),
                Cell::from(team.members.len().to_string()),
                Cell::from(bar).style(Style::default().fg(SUCCESS)),
                Cell::from(format!("{}/{}", counts.completed, counts.total)),
                Cell::from(counts.blocked.to_string()).style(if counts.blocked > 0 {
                    Style::default().fg(ERROR)
                } else {
                    Style::default().fg(MUTED)
                }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(34),
            Constraint::Percentage(12),
            Constraint::Percentage(26),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
        ],
    )
    .header(header)
    .block(bordered("Active Teams"));

    frame.render_widget(table, area);
}

fn draw_recent_activity(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let team = app.selected_team_name().unwrap_or_default();
    let items = crate::feed::team_feed(&app.state.snapshot.all_inboxes, &team, 10);

    let lines: Vec<Line> = items
        .iter()
        .rev()
        .map(|item| {
            Line::from(vec![
                Span::styled(
                    format!("{:>2} ", agent_initials(&item.from)),
                    Style::default().fg(agent_color(&item.from)).bold(),
                ),
                Span::styled(
                    format!("{:<9}", item.timestamp.map(|t| relative_to(t, now)).unwrap_or_default()),
                    Style::default().fg(MUTED),
                ),
                Span::styled(item.text.clone(), Style::default().fg(category_color(item.category))),
            ])
        })
        .collect();

    let title = if team.is_empty() {
        "Live Communication".to_string()
    } else {
        format!("Live Communication · {team}")
    };
    let paragraph = Paragraph::new(lines)
        .block(bordered(title))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn draw_tasks(frame: &mut Frame, app: &App, area: Rect) {
    let team_name = app.selected_team_name();
    let team = team_name.as_deref().and_then(|n| app.state.snapshot.team(n));

    let header = Row::new(vec!["ID", "Subject", "Status", "Owner", "Blocked by"])
        .style(Style::default().fg(PRIMARY).bold());

    let rows: Vec<Row> = team
        .map(|t| t.tasks.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|task| {
            let status_style = match task.status {
                TaskStatus::Completed => Style::default().fg(SUCCESS),
                TaskStatus::InProgress => Style::default().fg(WARNING),
                TaskStatus::Pending => Style::default().fg(Color::White),
                TaskStatus::Other => Style::default().fg(MUTED),
            };
            let subject = match (&task.status, &task.active_form) {
                (TaskStatus::InProgress, Some(active)) => active.clone(),
                _ => task.subject.clone(),
            };
            Row::new(vec![
                Cell::from(task.id.clone().unwrap_or_default()),
                Cell::from(truncate(&subject, 48)),
                Cell::from(task.status.label()).style(status_style),
                Cell::from(task.owner.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(task.blocked_by.join(", ")).style(if task.is_blocked() {
                    Style::default().fg(ERROR)
                } else {
                    Style::default().fg(MUTED)
                }),
            ])
        })
        .collect();

    let title = match (team_name.as_deref(), team) {
        (Some(name), Some(t)) => {
            let counts = t.task_counts();
            format!(
                "Tasks · {name} ({}/{} done, {:.0}%)  [ ] switch team",
                counts.completed,
                counts.total,
                counts.completion_rate()
            )
        }
        (Some(name), None) => format!("Tasks · {name}"),
        _ => "Tasks".to_string(),
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Percentage(45),
            Constraint::Length(12),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
        ],
    )
    .header(header)
    .block(bordered(title))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.tasks_state.clone());
}

fn draw_messages(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let search_style = if app.search_focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    };
    let cursor = if app.search_focused { "▌" } else { "" };
    let search = Paragraph::new(format!("🔍 {}{cursor}", app.search_query))
        .style(search_style)
        .block(
            Block::default()
                .title(if app.search_focused {
                    "Search all teams (Enter to apply, Esc to clear)"
                } else {
                    "Search (/ to focus)"
                })
                .borders(Borders::ALL)
                .border_style(search_style),
        );
    frame.render_widget(search, chunks[0]);

    let now = Utc::now();
    let items = app.messages();
    let searching = !app.search_query.trim().is_empty();
    let rows: Vec<Row> = items
        .iter()
        .map(|item| {
            let route = if searching {
                format!("{}: {} → {}", item.team, item.from, item.agent)
            } else {
                format!("{} → {}", item.from, item.agent)
            };
            Row::new(vec![
                Cell::from(item.timestamp.map(|t| relative_to(t, now)).unwrap_or_default())
                    .style(Style::default().fg(MUTED)),
                Cell::from(truncate(&route, 36)).style(Style::default().fg(agent_color(&item.from))),
                Cell::from(item.category.as_str()).style(Style::default().fg(category_color(item.category))),
                Cell::from(item.text.clone()).style(if item.read {
                    Style::default().fg(MUTED)
                } else {
                    Style::default()
                }),
            ])
        })
        .collect();

    let filter = app.category_filter.map_or("all", |c| c.as_str());
    let title = if searching {
        format!("Results ({}) · category: {filter}", items.len())
    } else {
        format!(
            "Messages · {} ({}) · category: {filter}",
            app.selected_team_name().unwrap_or_else(|| "no team".to_string()),
            items.len()
        )
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(30),
            Constraint::Length(13),
            Constraint::Min(20),
        ],
    )
    .header(Row::new(vec!["When", "Route", "Type", "Message"]).style(Style::default().fg(PRIMARY).bold()))
    .block(bordered(title))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, chunks[1], &mut app.messages_state.clone());
}

fn draw_outputs(frame: &mut Frame, app: &App, area: Rect) {
    let outputs = &app.state.snapshot.agent_outputs;
    let rows: Vec<Row> = outputs
        .iter()
        .map(|o| {
            let preview = o.content.lines().last().unwrap_or_default();
            Row::new(vec![
                Cell::from(o.task_id.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(o.display_size()),
                Cell::from(o.last_modified.as_deref().map(|t| relative_time(t, Utc::now())).unwrap_or_default()),
                Cell::from(truncate(preview, 80)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Min(20),
        ],
    )
    .header(Row::new(vec!["Task", "Size", "Updated", "Last line"]).style(Style::default().fg(PRIMARY).bold()))
    .block(bordered(format!("Agent Outputs ({})", outputs.len())))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.outputs_state.clone());
}

fn draw_history(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let history = &app.state.snapshot.team_history;
    let rows: Vec<Row> = history
        .iter()
        .map(|team| {
            let counts = team.task_counts();
            Row::new(vec![
                Cell::from(truncate(&team.name, 30)),
                Cell::from(team.members.len().to_string()),
                Cell::from(format!("{}/{}", counts.completed, counts.total)),
                Cell::from(format!("{:.0}%", counts.completion_rate())),
                Cell::from(team.created_at.as_deref().map(|t| relative_time(t, now)).unwrap_or_default()),
                Cell::from(team.last_modified.as_deref().map(|t| relative_time(t, now)).unwrap_or_default()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(10),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ],
    )
    .header(
        Row::new(vec!["Team", "Members", "Tasks", "Done", "Created", "Modified"])
            .style(Style::default().fg(PRIMARY).bold()),
    )
    .block(bordered(format!("Team History ({})", history.len())))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.history_state.clone());
}

fn draw_notifications(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let rows: Vec<Row> = app
        .notifications
        .items()
        .iter()
        .map(|n| {
            let marker = if n.read { " " } else { "●" };
            Row::new(vec![
                Cell::from(marker).style(Style::default().fg(PRIMARY)),
                Cell::from(NotificationGroup::of(n.timestamp, now).label()).style(Style::default().fg(MUTED)),
                Cell::from(n.kind.as_str()).style(Style::default().fg(notification_color(n.kind))),
                Cell::from(truncate(&n.title, 30)).style(Style::default().bold()),
                Cell::from(n.message.clone()),
                Cell::from(relative_to(n.timestamp, now)).style(Style::default().fg(MUTED)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Length(9),
            Constraint::Length(8),
            Constraint::Length(30),
            Constraint::Min(20),
            Constraint::Length(9),
        ],
    )
    .block(bordered(format!(
        "Notifications ({} unread) · Enter read · r read all · x clear",
        app.notifications.unread_count()
    )))
    .highlight_style(Style::default().bg(Color::DarkGray));

    frame.render_stateful_widget(table, area, &mut app.notifications_state.clone());
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left_text = match (app.get_status(), &app.state.last_error) {
        (Some(status), _) => status.to_string(),
        (None, Some(err)) if !app.state.is_connected => format!("⚠ {err}"),
        _ => "? Help | Tab Switch | / Search | q Quit".to_string(),
    };
    frame.render_widget(Paragraph::new(left_text).style(Style::default().fg(MUTED)), chunks[0]);

    let right_text = format!(
        "{} | Last update: {}",
        app.server_url,
        app.last_update
            .map(|t| format_elapsed(t.elapsed()))
            .unwrap_or_else(|| "never".to_string())
    );
    let right = Paragraph::new(right_text)
        .style(Style::default().fg(MUTED))
        .alignment(Alignment::Right);
    frame.render_widget(right, chunks[1]);
}

fn draw_help_overlay(frame: &mut Frame) {
    let area = centered_rect(60, 70, frame.size());
    frame.render_widget(Clear, area);

    let section = |title: &'static str| Line::from(title).style(Style::default().fg(SECONDARY));
    let help_text = vec![
        Line::from("Keyboard Shortcuts").style(Style::default().fg(PRIMARY).bold()),
        Line::from(""),
        section("Navigation:"),
        Line::from("  Tab / Shift+Tab    Switch between tabs"),
        Line::from("  1-6                Jump to a tab"),
        Line::from("  [ / ]              Previous / next team"),
        Line::from("  j/k or ↑/↓         Move in lists"),
        Line::from(""),
        section("Messages:"),
        Line::from("  /                  Search every team"),
        Line::from("  c                  Cycle category filter"),
        Line::from("  Esc                Clear search"),
        Line::from(""),
        section("Notifications:"),
        Line::from("  Enter              Mark selected read"),
        Line::from("  r                  Mark all read"),
        Line::from("  x                  Clear all"),
        Line::from(""),
        section("General:"),
        Line::from("  ?                  Toggle this help"),
        Line::from("  q / Ctrl+C         Quit"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(PRIMARY)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help, area);
}

// Helper functions

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn format_elapsed(elapsed: std::time::Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{secs}s ago")
    } else {
        format!("{}m ago", secs / 60)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
