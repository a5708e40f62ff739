//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Participant {0} is not active in this session")]
    InactiveParticipant(String),

    #[error("Direct mode requires exactly one active participant, found {0}")]
    InvalidDirectRoster(usize),

    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    #[error("Invalid session mode: {0}")]
    InvalidMode(String),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Action item not found: {0}")]
    ActionItemNotFound(String),

    #[error("Message {0} has no action plan")]
    NoActionPlan(String),

    #[error("Message text cannot be empty")]
    EmptyMessage,

    #[error("Nothing to regenerate: the last message is not from a participant")]
    NothingToRegenerate,

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl DomainError {
    /// Whether the error was caused by unparseable generation output
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, DomainError::MalformedResponse(_))
    }
}
