//! Participant entities

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// Fixed id of the human user.
pub const USER_ID: &str = "user";

/// Reserved id for timeline events emitted by the orchestrator.
pub const SYSTEM_ID: &str = "system";

/// Identifier of a message sender (Value Object)
///
/// Either a persona id, [`USER_ID`] or [`SYSTEM_ID`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The human user's id
    pub fn user() -> Self {
        Self(USER_ID.to_string())
    }

    /// The orchestrator's id for system events
    pub fn system() -> Self {
        Self(SYSTEM_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_user(&self) -> bool {
        self.0 == USER_ID
    }

    pub fn is_system(&self) -> bool {
        self.0 == SYSTEM_ID
    }

    /// True for AI personas (neither the user nor the system)
    pub fn is_persona(&self) -> bool {
        !self.is_user() && !self.is_system()
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ParticipantId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ParticipantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An AI persona taking part in sessions (Entity)
///
/// Immutable while a turn is running; the surrounding application may replace
/// it in the registry between turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Role label shown next to the name and given to the router
    pub role: String,
    /// Behavior instruction used as the system prompt for replies
    pub instruction: String,
    /// Display color hint, not interpreted by the orchestrator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Participant {
    pub fn new(
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
        role: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            instruction: instruction.into(),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_ids() {
        assert!(ParticipantId::user().is_user());
        assert!(ParticipantId::system().is_system());
        assert!(!ParticipantId::user().is_persona());
        assert!(ParticipantId::from("atlas").is_persona());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&ParticipantId::from("nova")).unwrap();
        assert_eq!(json, "\"nova\"");
    }

    #[test]
    fn test_participant_color_is_optional() {
        let p: Participant = serde_json::from_str(
            r#"{"id":"rex","name":"Rex","role":"Investor","instruction":"Be blunt."}"#,
        )
        .unwrap();
        assert_eq!(p.id.as_str(), "rex");
        assert!(p.color.is_none());
    }
}
