//! Domain layer for agora
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A session gathers a human and several AI personas. In **council** mode the
//! orchestrator decides who speaks next and lets the personas talk among
//! themselves; in **direct** mode exactly one persona answers each message.
//!
//! ## Phases
//!
//! Council sessions move forward through three phases:
//!
//! - **Exploration**: open the problem up
//! - **Synthesis**: converge on the strongest ideas
//! - **Action**: concrete next steps
//!
//! Automatic advances are gated by [`PhaseGuard`]; a human may override the
//! phase at any time.

pub mod conversation;
pub mod core;
pub mod orchestration;
pub mod parsing;
pub mod participant;
pub mod prompt;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use conversation::{
    action_plan::{ActionItem, ActionPlan},
    message::{Attachment, AttachmentKind, Message, MessageId, MessageKind, SystemEvent},
};
pub use core::error::DomainError;
pub use orchestration::{
    decision::{DecisionSource, SpeakerProposal, TurnDecision, fallback_speaker},
    phase::{Phase, PhaseGuard, turns_in_current_phase},
    state::{ConversationState, TurnPlan, TurnResolution, TurnTransition},
    status::ConversationStatus,
};
pub use parsing::{extract_json_block, parse_action_plan, parse_speaker_proposal, parse_starters};
pub use participant::{
    entities::{Participant, ParticipantId, SYSTEM_ID, USER_ID},
    presets::{COUNCILS, CouncilPreset, DEFAULT_STARTERS},
    registry::ParticipantRegistry,
};
pub use prompt::{PromptTemplate, ReplyTone};
pub use session::entities::{Session, SessionId, SessionMode};
