//! Dashboard state held by a live client

use serde::Serialize;
use serde_json::Value;

use super::connection::ConnectionPhase;
use super::update::{SliceUpdate, Update};
use crate::models::{AgentOutput, AllInboxes, DashboardStats, HistoricalTeam, Team};

/// Slices received from the server; each is replaced independently
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// Active teams
    pub teams: Vec<Team>,
    /// Aggregate counters, absent until first sent
    pub stats: Option<DashboardStats>,
    /// Finished teams
    pub team_history: Vec<HistoricalTeam>,
    /// Captured agent output files
    pub agent_outputs: Vec<AgentOutput>,
    /// Inboxes by team, then agent
    pub all_inboxes: AllInboxes,
}

impl DashboardSnapshot {
    /// Apply one slice replacement
    pub fn apply(&mut self, slice: SliceUpdate) {
        match slice {
            SliceUpdate::Teams(teams) => self.teams = teams,
            SliceUpdate::Stats(stats) => self.stats = Some(stats),
            SliceUpdate::TeamHistory(history) => self.team_history = history,
            SliceUpdate::AgentOutputs(outputs) => self.agent_outputs = outputs,
            SliceUpdate::AllInboxes(all) => self.all_inboxes = all,
            SliceUpdate::InboxDelta { team, inboxes } => {
                self.all_inboxes.insert(team, inboxes);
            }
        }
    }

    /// Look up a team by name
    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.name == name)
    }
}

/// Everything a subscriber sees: the slices plus connection status
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    /// Data slices
    #[serde(flatten)]
    pub snapshot: DashboardSnapshot,
    /// A session is open
    pub is_connected: bool,
    /// Most recent connection error, cleared on open
    pub last_error: Option<String>,
    /// Last decoded payload as received
    pub last_raw_message: Option<Value>,
    /// Failed attempts since the last open
    pub reconnect_attempts: u32,
    /// Connection phase
    pub phase: ConnectionPhase,
    /// Bumped once per applied update
    pub revision: u64,
}

impl DashboardState {
    /// Apply every slice of `update` and record it as the last raw message
    pub fn apply(&mut self, update: Update) {
        for slice in update.slices {
            self.snapshot.apply(slice);
        }
        self.last_raw_message = Some(update.raw);
        self.revision += 1;
    }

    /// Status line text for the connection
    pub fn status_label(&self) -> &'static str {
        match self.phase {
            ConnectionPhase::Open => "Live",
            ConnectionPhase::Connecting => "Connecting",
            ConnectionPhase::Closed => "Reconnecting",
            ConnectionPhase::Idle | ConnectionPhase::Stopped => "Offline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::update::decode;
    use crate::models::{AgentInbox, InboxMessage, TeamInboxes};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn inboxes(agent: &str, text: &str) -> TeamInboxes {
        let mut map = TeamInboxes::new();
        map.insert(
            agent.to_string(),
            AgentInbox {
                messages: vec![InboxMessage {
                    text: text.to_string(),
                    ..Default::default()
                }],
            },
        );
        map
    }

    #[test]
    fn test_stats_only_update_leaves_other_slices() {
        let mut state = DashboardState::default();
        state.apply(decode(&json!({"data": [{"name": "alpha"}]}).to_string()).unwrap());
        let before = state.snapshot.teams.clone();

        state.apply(decode(&json!({"stats": {"totalTeams": 1, "totalTasks": 4}}).to_string()).unwrap());

        assert_eq!(state.snapshot.teams, before);
        assert_eq!(state.snapshot.stats.unwrap().total_tasks, 4);
        assert_eq!(state.revision, 2);
    }

    #[test]
    fn test_inbox_delta_touches_only_its_team() {
        let mut state = DashboardState::default();
        state.snapshot.apply(SliceUpdate::InboxDelta {
            team: "alpha".into(),
            inboxes: inboxes("a1", "old"),
        });
        state.snapshot.apply(SliceUpdate::InboxDelta {
            team: "beta".into(),
            inboxes: inboxes("b1", "kept"),
        });

        state.apply(
            decode(
                &json!({
                    "type": "inbox_update",
                    "teamName": "alpha",
                    "inboxes": {"a2": {"messages": [{"text": "new"}]}}
                })
                .to_string(),
            )
            .unwrap(),
        );

        let alpha = &state.snapshot.all_inboxes["alpha"];
        assert!(!alpha.contains_key("a1"));
        assert_eq!(alpha["a2"].messages[0].text, "new");
        assert_eq!(state.snapshot.all_inboxes["beta"], inboxes("b1", "kept"));
    }

    #[test]
    fn test_all_inboxes_is_a_full_replace() {
        let mut state = DashboardState::default();
        state.snapshot.apply(SliceUpdate::InboxDelta {
            team: "alpha".into(),
            inboxes: inboxes("a1", "x"),
        });
        state.apply(decode(&json!({"allInboxes": {"beta": {}}}).to_string()).unwrap());
        assert_eq!(state.snapshot.all_inboxes.keys().collect::<Vec<_>>(), vec!["beta"]);
    }

    #[test]
    fn test_every_update_is_recorded_raw() {
        let mut state = DashboardState::default();
        state.apply(decode(r#"{"type": "heartbeat"}"#).unwrap());
        assert_eq!(state.last_raw_message, Some(json!({"type": "heartbeat"})));
        assert_eq!(state.snapshot, DashboardSnapshot::default());
    }

    #[test]
    fn test_status_label() {
        let mut state = DashboardState::default();
        assert_eq!(state.status_label(), "Offline");
        state.phase = ConnectionPhase::Open;
        assert_eq!(state.status_label(), "Live");
    }
}
