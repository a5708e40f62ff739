//! Session entities

use crate::core::error::DomainError;
use crate::orchestration::phase::Phase;
use crate::participant::entities::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Session identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Conversation mode of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Multi-participant autonomous conversation
    #[default]
    Council,
    /// Exclusive one-on-one exchange
    Direct,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionMode::Council => "council",
            SessionMode::Direct => "direct",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SessionMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "council" | "c" => Ok(SessionMode::Council),
            "direct" | "dm" | "d" => Ok(SessionMode::Direct),
            _ => Err(DomainError::InvalidMode(s.to_string())),
        }
    }
}

/// One bounded conversation (Entity)
///
/// A session owns exactly one message log, stored alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    /// Free-text objective given to every participant
    #[serde(default)]
    pub context: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// Display order only; scheduling ignores it
    pub active_participants: Vec<ParticipantId>,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub mode: SessionMode,
    /// Rolling summary of older messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Suggested opening prompts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub starters: Vec<String>,
}

impl Session {
    pub fn new(title: impl Into<String>, active_participants: Vec<ParticipantId>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            title: title.into(),
            context: String::new(),
            created_at: now,
            last_active_at: now,
            active_participants,
            phase: Phase::default(),
            mode: SessionMode::default(),
            summary: None,
            starters: Vec::new(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_id(mut self, id: SessionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_mode(mut self, mode: SessionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_starters(mut self, starters: Vec<String>) -> Self {
        self.starters = starters;
        self
    }

    // ==================== Queries ====================

    pub fn is_direct(&self) -> bool {
        self.mode == SessionMode::Direct
    }

    pub fn is_active_participant(&self, id: &str) -> bool {
        self.active_participants.iter().any(|p| p.as_str() == id)
    }

    /// Check the roster against the mode
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_direct() && self.active_participants.len() != 1 {
            return Err(DomainError::InvalidDirectRoster(
                self.active_participants.len(),
            ));
        }
        Ok(())
    }

    /// Require `id` to be in the active roster
    pub fn require_active(&self, id: &str) -> Result<ParticipantId, DomainError> {
        self.active_participants
            .iter()
            .find(|p| p.as_str() == id)
            .cloned()
            .ok_or_else(|| DomainError::InactiveParticipant(id.to_string()))
    }

    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}
