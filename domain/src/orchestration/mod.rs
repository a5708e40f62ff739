//! Turn orchestration domain.
//!
//! - [`phase::Phase`]: exploration → synthesis → action lifecycle
//! - [`status::ConversationStatus`]: idle / active / thinking / paused
//! - [`state::ConversationState`]: the per-session loop state machine
//! - [`decision::TurnDecision`]: who speaks next, and whether the phase advances

pub mod decision;
pub mod phase;
pub mod state;
pub mod status;
