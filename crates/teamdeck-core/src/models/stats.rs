//! Aggregate dashboard counters

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError};

/// Aggregate counts across all active teams
#[serde_as]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    /// Active teams
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub total_teams: u64,
    /// Agents across all teams
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub total_agents: u64,
    /// Tasks across all teams
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub total_tasks: u64,
    /// Tasks in progress
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub in_progress_tasks: u64,
    /// Completed tasks
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub completed_tasks: u64,
    /// Blocked tasks
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub blocked_tasks: u64,
}
