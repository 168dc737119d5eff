//! Team, member, and task models

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnError, VecSkipError};

/// Status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
    /// Any status string the dashboard does not know
    #[serde(other)]
    Other,
}

impl TaskStatus {
    /// Short label for display
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
            Self::Other => "unknown",
        }
    }
}

/// A single task on a team's task list
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Task {
    /// Task identifier (numeric ids arrive as numbers)
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "super::lenient_string"
    )]
    pub id: Option<String>,

    /// One-line subject
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub subject: String,

    /// Longer description
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub description: Option<String>,

    /// Current status
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub status: TaskStatus,

    /// Agent that owns the task
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub owner: Option<String>,

    /// Tasks this one blocks
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(deserialize_with = "super::lenient_strings")]
    pub blocks: Vec<String>,

    /// Tasks blocking this one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(deserialize_with = "super::lenient_strings")]
    pub blocked_by: Vec<String>,

    /// Present-tense description while in progress
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub active_form: Option<String>,

    /// Fields the dashboard does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// Whether any other task blocks this one
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty() && self.status != TaskStatus::Completed
    }
}

/// A team member (agent)
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Member {
    /// Agent name
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub name: String,

    /// Agent identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub agent_id: Option<String>,

    /// Agent type (e.g. "general-purpose")
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub agent_type: Option<String>,

    /// Display color tag
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub color: Option<String>,

    /// Fields the dashboard does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A team with its roster and task list
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Team {
    /// Team name
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub name: String,

    /// Team description
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub description: Option<String>,

    /// Members
    #[serde_as(deserialize_as = "DefaultOnError<VecSkipError<_>>")]
    pub members: Vec<Member>,

    /// Tasks
    #[serde_as(deserialize_as = "DefaultOnError<VecSkipError<_>>")]
    pub tasks: Vec<Task>,

    /// Fields the dashboard does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Team {
    /// Task counts for this team
    pub fn task_counts(&self) -> TaskCounts {
        TaskCounts::from_tasks(&self.tasks)
    }
}

/// A past team, as reported in the history slice
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoricalTeam {
    /// Team name
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub name: String,

    /// Members
    #[serde_as(deserialize_as = "DefaultOnError<VecSkipError<_>>")]
    pub members: Vec<Member>,

    /// Tasks
    #[serde_as(deserialize_as = "DefaultOnError<VecSkipError<_>>")]
    pub tasks: Vec<Task>,

    /// When the team was created
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "super::lenient_string")]
    pub created_at: Option<String>,

    /// Last modification time of the team's files
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "super::lenient_string")]
    pub last_modified: Option<String>,

    /// Fields the dashboard does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoricalTeam {
    /// Task counts for this team
    pub fn task_counts(&self) -> TaskCounts {
        TaskCounts::from_tasks(&self.tasks)
    }
}

/// Task counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    /// All tasks
    pub total: usize,
    /// Completed tasks
    pub completed: usize,
    /// Tasks in progress
    pub in_progress: usize,
    /// Pending tasks
    pub pending: usize,
    /// Unfinished tasks with blockers
    pub blocked: usize,
}

impl TaskCounts {
    /// Count a task list
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            counts.total += 1;
            match task.status {
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::InProgress => counts.in_progress += 1,
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Other => {}
            }
            if task.is_blocked() {
                counts.blocked += 1;
            }
            counts
        })
    }

    /// Completed share in percent (0 when there are no tasks)
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}
