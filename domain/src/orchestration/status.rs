//! Conversation status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Loop status of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// No autonomous turn pending
    #[default]
    Idle,
    /// The loop keeps scheduling turns
    Active,
    /// A turn is executing (sub-state of active)
    Thinking,
    /// No turns are scheduled until resumed
    Paused,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Idle => "idle",
            ConversationStatus::Active => "active",
            ConversationStatus::Thinking => "thinking",
            ConversationStatus::Paused => "paused",
        }
    }

    /// Whether the loop should schedule another turn
    pub fn wants_turn(&self) -> bool {
        matches!(self, ConversationStatus::Active)
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
