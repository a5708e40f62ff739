//! Turn progress port
//!
//! Callbacks fired while a turn executes, so the presentation layer can show
//! who is speaking and when a retry is pending.

use crate::ports::llm_gateway::GenerationError;
use agora_domain::TurnDecision;
use std::time::Duration;

/// Callback for progress updates during a turn
pub trait TurnProgress: Send + Sync {
    /// A speaker was resolved and generation is starting
    fn on_speaker_selected(&self, _decision: &TurnDecision) {}

    /// A transient failure will be retried after `delay`
    fn on_retry(&self, _attempt: u32, _delay: Duration, _error: &GenerationError) {}
}

/// No-op progress for when progress reporting is not needed
pub struct NoTurnProgress;

impl TurnProgress for NoTurnProgress {}
