//! Closed set of message categories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category of an inter-agent message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Progress or idle chatter
    #[default]
    Status,
    /// A task finished
    Completion,
    /// Agents coordinating work
    Coordination,
    /// A question needing an answer
    Question,
    /// Work handed to an agent
    Assignment,
    /// Lifecycle control (shutdown, plan approval)
    System,
}

impl Category {
    /// Every category, in display order
    pub const ALL: [Category; 6] = [
        Self::Status,
        Self::Completion,
        Self::Coordination,
        Self::Question,
        Self::Assignment,
        Self::System,
    ];

    /// Wire name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Completion => "completion",
            Self::Coordination => "coordination",
            Self::Question => "question",
            Self::Assignment => "assignment",
            Self::System => "system",
        }
    }

    /// Map an envelope `type` to its category
    ///
    /// Unknown or missing types are plain status updates.
    pub fn from_envelope_type(kind: Option<&str>) -> Self {
        match kind {
            Some("task_completed") => Self::Completion,
            Some("task_assigned" | "task_assignment") => Self::Assignment,
            Some("question") => Self::Question,
            Some("coordination") => Self::Coordination,
            Some(
                "shutdown_request"
                | "shutdown_response"
                | "plan_approval_request"
                | "plan_approval_response",
            ) => Self::System,
            _ => Self::Status,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::error::Error::config(format!("unknown category: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert!("urgent".parse::<Category>().is_err());
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Category::Coordination).unwrap(),
            "\"coordination\""
        );
    }
}
