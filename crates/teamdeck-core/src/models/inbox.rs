//! Per-agent inbox models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError, VecSkipError};

/// A message delivered to an agent's inbox
///
/// `text` is opaque here; only the classifier interprets it.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboxMessage {
    /// Sending agent
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub from: Option<String>,

    /// Raw message body, frequently a JSON envelope
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub text: String,

    /// Precomputed one-line summary
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub summary: Option<String>,

    /// RFC 3339 timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(deserialize_with = "super::lenient_string")]
    pub timestamp: Option<String>,

    /// Sender color tag
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub color: Option<String>,

    /// Whether the recipient has read it
    #[serde_as(deserialize_as = "DefaultOnError")]
    pub read: bool,
}

/// One agent's inbox
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentInbox {
    /// Messages, oldest first
    #[serde_as(deserialize_as = "DefaultOnError<VecSkipError<_>>")]
    pub messages: Vec<InboxMessage>,
}

/// Inboxes of one team, keyed by agent name
pub type TeamInboxes = BTreeMap<String, AgentInbox>;

/// Inboxes of every team, keyed by team name
pub type AllInboxes = BTreeMap<String, TeamInboxes>;
