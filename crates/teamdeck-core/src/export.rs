//! JSON and CSV export of dashboard data

use std::fmt::Write as _;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::classify::truncate_chars;
use crate::error::{Error, Result};
use crate::models::{AgentOutput, InboxMessage, Team};

/// Message text longer than this is cut in message exports
pub const MESSAGE_TEXT_LIMIT: usize = 200;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Pretty-printed JSON
    Json,
    /// Comma-separated values with a header row
    Csv,
}

impl ExportFormat {
    /// File extension
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// Pretty-printed JSON
pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// CSV with the header taken from the first row's keys.
///
/// Returns `None` for empty input. Strings are quoted with embedded quotes
/// doubled, numbers and booleans are written bare, `null` and missing keys are
/// empty, nested values become quoted compact JSON.
pub fn to_csv(rows: &[Value]) -> Option<String> {
    let headers: Vec<&String> = rows.first()?.as_object()?.keys().collect();

    let mut out = headers
        .iter()
        .map(|h| h.as_str())
        .collect::<Vec<_>>()
        .join(",");
    for row in rows {
        out.push('\n');
        let cells: Vec<String> = headers
            .iter()
            .map(|h| csv_cell(row.get(h.as_str())))
            .collect();
        out.push_str(&cells.join(","));
    }
    Some(out)
}

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => quote(s),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(nested) => quote(&nested.to_string()),
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// One agent's messages as CSV, every field quoted
pub fn messages_to_csv(team: &str, agent: &str, messages: &[InboxMessage]) -> String {
    let mut out = String::from("timestamp,from,agentName,teamName,summary,text");
    for m in messages {
        let fields = [
            m.timestamp.as_deref().unwrap_or_default(),
            m.from.as_deref().unwrap_or_default(),
            agent,
            team,
            m.summary.as_deref().unwrap_or_default(),
        ];
        out.push('\n');
        for field in fields {
            let _ = write!(out, "{},", quote(field));
        }
        out.push_str(&quote(&cut(&m.text, MESSAGE_TEXT_LIMIT)));
    }
    out
}

fn cut(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// One row per team with its task counts
pub fn team_rows(teams: &[Team]) -> Vec<Value> {
    teams
        .iter()
        .map(|team| {
            let counts = team.task_counts();
            json!({
                "name": team.name,
                "description": team.description,
                "members": team.members.len(),
                "tasks": counts.total,
                "completed": counts.completed,
                "inProgress": counts.in_progress,
                "pending": counts.pending,
                "blocked": counts.blocked,
            })
        })
        .collect()
}

/// One row per task, optionally restricted to one team
pub fn task_rows(teams: &[Team], team: Option<&str>) -> Vec<Value> {
    teams
        .iter()
        .filter(|t| team.map_or(true, |name| t.name == name))
        .flat_map(|t| {
            t.tasks.iter().map(move |task| {
                json!({
                    "team": t.name,
                    "id": task.id,
                    "subject": task.subject,
                    "status": task.status,
                    "owner": task.owner,
                    "blockedBy": task.blocked_by.join(" "),
                })
            })
        })
        .collect()
}

/// One row per agent output, content cut like message text
pub fn output_rows(outputs: &[AgentOutput]) -> Vec<Value> {
    outputs
        .iter()
        .map(|o| {
            json!({
                "taskId": o.task_id,
                "size": o.size,
                "lastModified": o.last_modified,
                "content": truncate_chars(&o.content, MESSAGE_TEXT_LIMIT),
            })
        })
        .collect()
}

/// `<stem>-<YYYY-MM-DD>.<ext>`
pub fn default_filename(stem: &str, ext: &str, date: NaiveDate) -> String {
    format!("{stem}-{}.{ext}", date.format("%Y-%m-%d"))
}

/// Write an export, creating parent directories
pub fn write_export(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
        .map_err(|e| Error::export(format!("failed to write {}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = contents.len(), "Export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Task, TaskStatus};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_to_json_is_pretty() {
        let data = json!([{"name": "Alice", "role": "lead"}]);
        let out = to_json(&data).unwrap();
        assert!(out.contains("\n  {"));
        assert_eq!(serde_json::from_str::<Value>(&out).unwrap(), data);
        assert_eq!(to_json(&Vec::<Value>::new()).unwrap(), "[]");
    }

    #[test]
    fn test_csv_headers_and_rows() {
        let rows = vec![
            json!({"name": "Alice", "role": "lead", "tasks": 5}),
            json!({"name": "Bob", "role": "agent", "tasks": 3}),
        ];
        assert_eq!(
            to_csv(&rows).unwrap(),
            "name,role,tasks\n\"Alice\",\"lead\",5\n\"Bob\",\"agent\",3"
        );
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let rows = vec![json!({"note": "He said \"hello\""})];
        assert_eq!(to_csv(&rows).unwrap(), "note\n\"He said \"\"hello\"\"\"");
    }

    #[test]
    fn test_csv_empty_input_writes_nothing() {
        assert_eq!(to_csv(&[]), None);
    }

    #[test]
    fn test_csv_nulls_bools_and_nesting() {
        let rows = vec![
            json!({"a": null, "b": true, "c": {"x": 1}}),
            json!({"b": false}),
        ];
        assert_eq!(
            to_csv(&rows).unwrap(),
            "a,b,c\n,true,\"{\"\"x\"\":1}\"\n,false,"
        );
    }

    #[test]
    fn test_messages_csv() {
        let messages = vec![InboxMessage {
            from: Some("lead".into()),
            text: "x".repeat(250),
            summary: Some("Say \"hi\"".into()),
            timestamp: Some("2026-02-18T10:00:00Z".into()),
            ..Default::default()
        }];
        let csv = messages_to_csv("alpha", "worker", &messages);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,from,agentName,teamName,summary,text");
        let expected = format!(
            "\"2026-02-18T10:00:00Z\",\"lead\",\"worker\",\"alpha\",\"Say \"\"hi\"\"\",\"{}\"",
            "x".repeat(200)
        );
        assert_eq!(lines[1], expected);
    }

    #[test]
    fn test_task_rows() {
        let teams = vec![Team {
            name: "alpha".into(),
            tasks: vec![Task {
                id: Some("1".into()),
                subject: "Fix bug".into(),
                status: TaskStatus::Completed,
                owner: Some("agent-1".into()),
                ..Default::default()
            }],
            ..Default::default()
        }];
        let csv = to_csv(&task_rows(&teams, None)).unwrap();
        assert_eq!(
            csv,
            "team,id,subject,status,owner,blockedBy\n\"alpha\",\"1\",\"Fix bug\",\"completed\",\"agent-1\",\"\""
        );
        assert!(task_rows(&teams, Some("beta")).is_empty());
    }

    #[test]
    fn test_default_filename() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 18).unwrap();
        assert_eq!(default_filename("teams", "csv", date), "teams-2026-02-18.csv");
    }

    #[test]
    fn test_write_export_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_export(&path, "[]").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "[]");
    }
}
