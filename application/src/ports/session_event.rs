//! Session events emitted by the session controller for the presentation layer
//!
//! These events form the output port from the application layer to the
//! presentation layer, which renders them (console, REPL).

use agora_domain::{ConversationStatus, Message, MessageId, ParticipantId, Phase, Session};

/// Events broadcast by a running session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Loop status changed
    StatusChanged(ConversationStatus),
    /// A speaker was chosen and is generating
    SpeakerSelected {
        speaker: ParticipantId,
        rationale: String,
    },
    /// A message was appended to the log
    MessageAppended(Message),
    /// A message was edited in place (text or action item flags)
    MessageUpdated(Message),
    /// A trailing message was removed for regeneration
    MessageRemoved(MessageId),
    /// The whole log was emptied
    HistoryCleared,
    /// The log was replaced by a reconciled snapshot
    HistoryReloaded(Vec<Message>),
    /// Phase moved
    PhaseChanged { from: Phase, to: Phase, manual: bool },
    /// Safety valve paused the loop
    SafetyValveTripped { consecutive_turns: usize },
    /// Session metadata changed (summary, context, starters)
    SessionUpdated(Box<Session>),
}
