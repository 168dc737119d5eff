//! Decoding of pushed updates into slice updates
//!
//! Every payload is matched against each known shape independently; the
//! result is the list of slice replacements it carries, in a fixed order.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{AgentOutput, AllInboxes, DashboardStats, HistoricalTeam, Team, TeamInboxes};

/// `type` of an update that replaces one team's inboxes
pub const INBOX_UPDATE: &str = "inbox_update";
/// `type` of an update that replaces the team roster
pub const TEAMS_UPDATE: &str = "teams_update";
/// `type` of a task change, which carries the full roster
pub const TASK_UPDATE: &str = "task_update";
/// `type` of an update that replaces the agent outputs
pub const AGENT_OUTPUTS_UPDATE: &str = "agent_outputs_update";

/// One slice replacement carried by an update
#[derive(Debug, Clone, PartialEq)]
pub enum SliceUpdate {
    /// Replace `teams`
    Teams(Vec<Team>),
    /// Replace `stats`
    Stats(DashboardStats),
    /// Replace `team_history`
    TeamHistory(Vec<HistoricalTeam>),
    /// Replace `agent_outputs`
    AgentOutputs(Vec<AgentOutput>),
    /// Replace `all_inboxes` wholesale
    AllInboxes(AllInboxes),
    /// Replace a single team's entry in `all_inboxes`
    InboxDelta {
        /// Team whose inboxes are replaced
        team: String,
        /// New inboxes for that team
        inboxes: TeamInboxes,
    },
}

impl SliceUpdate {
    /// Slice name, for logging
    pub fn slice(&self) -> &'static str {
        match self {
            Self::Teams(_) => "teams",
            Self::Stats(_) => "stats",
            Self::TeamHistory(_) => "team_history",
            Self::AgentOutputs(_) => "agent_outputs",
            Self::AllInboxes(_) => "all_inboxes",
            Self::InboxDelta { .. } => "inbox_delta",
        }
    }
}

/// A decoded update
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Slice replacements, in application order
    pub slices: Vec<SliceUpdate>,
    /// The decoded message itself
    pub raw: Value,
}

impl Update {
    /// Declared `type` of the message, if any
    pub fn kind(&self) -> Option<&str> {
        self.raw.get("type").and_then(Value::as_str)
    }
}

/// Decode one pushed payload.
///
/// Fails only when the payload is not a JSON object. A recognised field with
/// the wrong shape skips that slice and keeps the rest.
pub fn decode(text: &str) -> Result<Update> {
    let raw: Value = serde_json::from_str(text).map_err(|e| Error::decode(e.to_string()))?;
    let Some(message) = raw.as_object() else {
        return Err(Error::decode("update is not a JSON object"));
    };

    let kind = message.get("type").and_then(Value::as_str);
    let mut slices = Vec::new();

    // `teams_update` / `task_update` carry their roster in `data` too, so the
    // field rule below already covers them.
    if let Some(teams) = typed::<Vec<Team>>(message, "data") {
        slices.push(SliceUpdate::Teams(teams));
    }
    if let Some(stats) = typed::<DashboardStats>(message, "stats") {
        slices.push(SliceUpdate::Stats(stats));
    }
    if let Some(history) = typed::<Vec<HistoricalTeam>>(message, "teamHistory") {
        slices.push(SliceUpdate::TeamHistory(history));
    }
    let outputs = if present(message, "agentOutputs") {
        typed::<Vec<AgentOutput>>(message, "agentOutputs")
    } else {
        typed::<Vec<AgentOutput>>(message, "outputs")
    };
    let had_outputs = outputs.is_some();
    if let Some(outputs) = outputs {
        slices.push(SliceUpdate::AgentOutputs(outputs));
    }
    if let Some(all) = typed::<AllInboxes>(message, "allInboxes") {
        slices.push(SliceUpdate::AllInboxes(all));
    }

    match kind {
        Some(INBOX_UPDATE) => match message.get("teamName").and_then(Value::as_str) {
            Some(team) => {
                let inboxes = if present(message, "inboxes") {
                    typed::<TeamInboxes>(message, "inboxes")
                } else {
                    Some(TeamInboxes::new())
                };
                if let Some(inboxes) = inboxes {
                    slices.push(SliceUpdate::InboxDelta {
                        team: team.to_string(),
                        inboxes,
                    });
                }
            }
            None => warn!("inbox_update without teamName ignored"),
        },
        // An outputs delta without outputs clears the slice.
        Some(AGENT_OUTPUTS_UPDATE) if !had_outputs && !present(message, "outputs") => {
            slices.push(SliceUpdate::AgentOutputs(Vec::new()));
        }
        _ => {}
    }

    Ok(Update { slices, raw })
}

/// Field exists and is not `null`
fn present(message: &Map<String, Value>, key: &str) -> bool {
    message.get(key).is_some_and(|v| !v.is_null())
}

fn typed<'a, T: Deserialize<'a>>(message: &'a Map<String, Value>, key: &str) -> Option<T> {
    let value = message.get(key).filter(|v| !v.is_null())?;
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(field = key, error = %e, "Skipping malformed field in update");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn slices(value: Value) -> Vec<&'static str> {
        decode(&value.to_string())
            .unwrap()
            .slices
            .iter()
            .map(SliceUpdate::slice)
            .collect()
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        assert!(matches!(decode("not json"), Err(Error::Decode(_))));
        assert!(matches!(decode("{\"data\": ["), Err(Error::Decode(_))));
        assert!(matches!(decode("[1, 2]"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_fields_decode_in_fixed_order() {
        let kinds = slices(json!({
            "allInboxes": {},
            "agentOutputs": [],
            "teamHistory": [],
            "stats": {"totalTeams": 1},
            "data": [{"name": "alpha"}]
        }));
        assert_eq!(
            kinds,
            vec!["teams", "stats", "team_history", "agent_outputs", "all_inboxes"]
        );
    }

    #[test]
    fn test_outputs_alias() {
        let update = decode(&json!({"outputs": [{"taskId": "t1", "content": "hi"}]}).to_string()).unwrap();
        match &update.slices[..] {
            [SliceUpdate::AgentOutputs(outputs)] => assert_eq!(outputs[0].task_id.as_deref(), Some("t1")),
            other => panic!("unexpected slices: {other:?}"),
        }
    }

    #[test]
    fn test_agent_outputs_wins_over_alias() {
        let update = decode(
            &json!({"agentOutputs": [{"content": "a"}], "outputs": [{"content": "b"}, {"content": "c"}]})
                .to_string(),
        )
        .unwrap();
        assert_eq!(update.slices.len(), 1);
        match &update.slices[0] {
            SliceUpdate::AgentOutputs(outputs) => assert_eq!(outputs.len(), 1),
            other => panic!("unexpected slice: {other:?}"),
        }
    }

    #[test]
    fn test_inbox_delta() {
        let update = decode(
            &json!({
                "type": "inbox_update",
                "teamName": "alpha",
                "inboxes": {"worker": {"messages": [{"from": "lead", "text": "go"}]}}
            })
            .to_string(),
        )
        .unwrap();
        match &update.slices[..] {
            [SliceUpdate::InboxDelta { team, inboxes }] => {
                assert_eq!(team, "alpha");
                assert_eq!(inboxes["worker"].messages[0].text, "go");
            }
            other => panic!("unexpected slices: {other:?}"),
        }
        assert_eq!(update.kind(), Some(INBOX_UPDATE));
    }

    #[test]
    fn test_inbox_delta_without_team_is_ignored() {
        assert!(slices(json!({"type": "inbox_update", "inboxes": {}})).is_empty());
    }

    #[test]
    fn test_typed_team_delta_replaces_teams_once() {
        assert_eq!(
            slices(json!({"type": "teams_update", "data": [{"name": "a"}]})),
            vec!["teams"]
        );
        assert_eq!(
            slices(json!({"type": "task_update", "data": [{"name": "a"}]})),
            vec!["teams"]
        );
        assert!(slices(json!({"type": "task_update"})).is_empty());
    }

    #[test]
    fn test_outputs_delta() {
        assert_eq!(
            slices(json!({"type": "agent_outputs_update", "outputs": [{"content": "x"}]})),
            vec!["agent_outputs"]
        );
        let cleared = decode(&json!({"type": "agent_outputs_update"}).to_string()).unwrap();
        assert_eq!(cleared.slices, vec![SliceUpdate::AgentOutputs(Vec::new())]);
    }

    #[test]
    fn test_wrong_shape_skips_only_that_slice() {
        assert_eq!(
            slices(json!({"data": "not a list", "stats": {"totalTasks": 3}})),
            vec!["stats"]
        );
    }

    #[test]
    fn test_mistyped_record_fields_keep_the_slice() {
        assert_eq!(
            slices(json!({"data": [{"name": "alpha", "tasks": [{"subject": "x", "blockedBy": null}]}]})),
            vec!["teams"]
        );
        assert_eq!(
            slices(json!({"data": [{"name": "alpha", "tasks": [{"subject": "x", "blockedBy": [1]}]}]})),
            vec!["teams"]
        );
        assert_eq!(
            slices(json!({"allInboxes": {"alpha": {"lead": {"messages": [{"from": "w", "text": null}]}}}})),
            vec!["all_inboxes"]
        );

        let update = decode(&json!({"outputs": [{"taskId": "t1", "content": "hi", "size": 12.5}]}).to_string()).unwrap();
        match &update.slices[..] {
            [SliceUpdate::AgentOutputs(outputs)] => assert_eq!(outputs[0].size, 13),
            other => panic!("unexpected slices: {other:?}"),
        }
    }

    #[test]
    fn test_null_fields_are_absent() {
        assert!(slices(json!({"data": null, "stats": null, "type": "heartbeat"})).is_empty());
    }
}
