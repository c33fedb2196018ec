use crate::domain::department::Department;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies a conversation across turns. Minted server-side when the
/// transport does not supply one.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new_random() -> ConversationId {
        ConversationId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Guest,
    Agent,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Guest => "guest",
            Sender::Agent => "agent",
        }
    }

    pub fn parse(value: &str) -> Option<Sender> {
        match value {
            "guest" => Some(Sender::Guest),
            "agent" => Some(Sender::Agent),
            _ => None,
        }
    }
}

/// One logged message of a conversation. `department` is the primary
/// department of the turn; `None` when no department was resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: i64,
    pub conversation_id: ConversationId,
    pub sender: Sender,
    pub department: Option<Department>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Creation input for a conversation turn.
#[derive(Clone, Debug, PartialEq)]
pub struct NewConversationTurn {
    pub conversation_id: ConversationId,
    pub sender: Sender,
    pub department: Option<Department>,
    pub content: String,
}
