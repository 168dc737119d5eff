//! Agent output records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DefaultOnError};

/// Captured output of one background task
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentOutput {
    /// Task the output belongs to
    #[serde(deserialize_with = "super::lenient_string")]
    pub task_id: Option<String>,

    /// Output text
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub content: String,

    /// Size in bytes as reported by the backend
    #[serde(deserialize_with = "super::lenient_u64")]
    pub size: u64,

    /// Last modification time
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "super::lenient_string")]
    pub last_modified: Option<String>,

    /// Fields the dashboard does not interpret
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AgentOutput {
    /// Human-readable size ("512 B", "1.5 KB", "2.0 MB")
    pub fn display_size(&self) -> String {
        let bytes = self.size;
        if bytes < 1024 {
            format!("{bytes} B")
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
