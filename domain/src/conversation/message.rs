//! Message entity

use super::action_plan::ActionPlan;
use crate::orchestration::phase::Phase;
use crate::participant::entities::ParticipantId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique, generation-ordered message identifier (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a new time-ordered id (UUIDv7)
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Kind of log entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Normal,
    /// Timeline event authored by the orchestrator
    System,
}

/// What a system message records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SystemEvent {
    /// The session moved to a new phase
    PhaseChanged { from: Phase, to: Phase, manual: bool },
    /// The user asked to be interviewed
    InterviewRequested,
}

/// Attachment media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Audio,
    File,
}

/// Opaque attachment carried with a message; never interpreted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub mime_type: String,
    pub name: String,
    /// Encoded payload
    pub data: String,
}

/// One entry in a session's append-only log (Entity)
///
/// Only `text` and action item completion flags may change after append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: ParticipantId,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    /// Why this speaker was chosen (audit only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<SystemEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_plan: Option<ActionPlan>,
}

impl Message {
    fn base(sender: ParticipantId, text: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            rationale: None,
            kind: MessageKind::Normal,
            event: None,
            action_plan: None,
        }
    }

    /// A message typed by the human user
    pub fn human(text: impl Into<String>) -> Self {
        Self::base(ParticipantId::user(), text)
    }

    /// A reply generated for a persona
    pub fn persona(sender: ParticipantId, text: impl Into<String>) -> Self {
        Self::base(sender, text)
    }

    /// A timeline event authored by the orchestrator
    pub fn system(text: impl Into<String>, event: SystemEvent) -> Self {
        let mut message = Self::base(ParticipantId::system(), text);
        message.kind = MessageKind::System;
        message.event = Some(event);
        message
    }

    /// Phase transition event, recorded before the next persona reply
    pub fn phase_changed(from: Phase, to: Phase, manual: bool) -> Self {
        let text = if manual {
            format!("The user moved the phase to: {}", to.as_str().to_uppercase())
        } else {
            format!(
                "The moderator advanced the phase to: {}",
                to.as_str().to_uppercase()
            )
        };
        Self::system(text, SystemEvent::PhaseChanged { from, to, manual })
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_action_plan(mut self, plan: ActionPlan) -> Self {
        self.action_plan = Some(plan);
        self
    }

    pub fn is_from_human(&self) -> bool {
        self.sender.is_user()
    }

    /// True when an AI persona authored the message
    pub fn is_from_persona(&self) -> bool {
        self.kind == MessageKind::Normal && self.sender.is_persona()
    }

    pub fn is_system(&self) -> bool {
        self.kind == MessageKind::System
    }

    pub fn is_phase_change(&self) -> bool {
        matches!(self.event, Some(SystemEvent::PhaseChanged { .. }))
    }
}
