//! Per-session loop state machine.
//!
//! [`ConversationState`] owns the status, the consecutive bot turn counter
//! used by the safety valve, and the one-shot nudge / interview flags.
//! The session controller mutates it from a single task, so it needs no
//! interior locking.

use super::status::ConversationStatus;
use crate::participant::entities::ParticipantId;
use crate::session::entities::SessionMode;

/// One-shot inputs consumed by the turn about to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnPlan {
    /// Speaker forced by a nudge, bypassing speaker selection
    pub forced_speaker: Option<ParticipantId>,
    /// The speaker should ask a single clarifying question
    pub interview: bool,
}

/// How a turn ended, as far as the loop is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnResolution {
    /// A persona reply was appended
    Replied { nudged: bool, interview: bool },
    /// No speaker could be resolved
    NoSpeaker,
    /// Generation or local persistence failed
    Failed,
}

/// Status change produced by completing a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnTransition {
    pub status: ConversationStatus,
    pub safety_valve_tripped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    status: ConversationStatus,
    consecutive_bot_turns: usize,
    interview_requested: bool,
    pending_nudge: Option<ParticipantId>,
    safety_valve_cap: usize,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new(6)
    }
}

impl ConversationState {
    pub fn new(safety_valve_cap: usize) -> Self {
        Self {
            status: ConversationStatus::Idle,
            consecutive_bot_turns: 0,
            interview_requested: false,
            pending_nudge: None,
            safety_valve_cap: safety_valve_cap.max(1),
        }
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    pub fn consecutive_bot_turns(&self) -> usize {
        self.consecutive_bot_turns
    }

    pub fn interview_requested(&self) -> bool {
        self.interview_requested
    }

    pub fn pending_nudge(&self) -> Option<&ParticipantId> {
        self.pending_nudge.as_ref()
    }

    pub fn safety_valve_cap(&self) -> usize {
        self.safety_valve_cap
    }

    // ==================== Commands ====================

    /// A human message always resets the counter and reactivates the loop
    pub fn on_human_message(&mut self) {
        self.consecutive_bot_turns = 0;
        self.status = ConversationStatus::Active;
    }

    /// Start the loop. Returns false when it was already running.
    pub fn start(&mut self) -> bool {
        match self.status {
            ConversationStatus::Idle | ConversationStatus::Paused => {
                self.status = ConversationStatus::Active;
                true
            }
            ConversationStatus::Active | ConversationStatus::Thinking => false,
        }
    }

    /// Stop scheduling further turns
    pub fn pause(&mut self) {
        self.status = ConversationStatus::Paused;
    }

    /// Resume after a pause. Returns false when not paused.
    pub fn resume(&mut self) -> bool {
        if self.status == ConversationStatus::Paused {
            self.status = ConversationStatus::Active;
            true
        } else {
            false
        }
    }

    /// Force `speaker` on the next turn and reset the counter
    pub fn nudge(&mut self, speaker: ParticipantId) {
        self.pending_nudge = Some(speaker);
        self.consecutive_bot_turns = 0;
        self.status = ConversationStatus::Active;
    }

    /// Ask the next speaker to interview the user
    pub fn request_interview(&mut self) {
        self.interview_requested = true;
        self.status = ConversationStatus::Active;
    }

    /// Reactivate after the last non-human message was removed
    pub fn regenerate(&mut self) {
        self.consecutive_bot_turns = self.consecutive_bot_turns.saturating_sub(1);
        self.status = ConversationStatus::Active;
    }

    /// Return to idle without touching the counter
    pub fn idle(&mut self) {
        self.status = ConversationStatus::Idle;
    }

    /// Reset everything after the log was cleared
    pub fn clear(&mut self) {
        self.status = ConversationStatus::Idle;
        self.consecutive_bot_turns = 0;
        self.interview_requested = false;
        self.pending_nudge = None;
    }

    // ==================== Turn lifecycle ====================

    /// Mark a turn in flight, consuming the one-shot flags.
    ///
    /// Returns `None` unless the loop is active.
    pub fn begin_turn(&mut self) -> Option<TurnPlan> {
        if !self.status.wants_turn() {
            return None;
        }
        self.status = ConversationStatus::Thinking;
        Some(TurnPlan {
            forced_speaker: self.pending_nudge.take(),
            interview: std::mem::take(&mut self.interview_requested),
        })
    }

    /// Apply the outcome of a finished turn
    pub fn complete_turn(&mut self, resolution: TurnResolution, mode: SessionMode) -> TurnTransition {
        // a pause that arrived mid-turn wins over rescheduling
        let paused_mid_turn = self.status == ConversationStatus::Paused;
        let mut tripped = false;

        let next = match resolution {
            TurnResolution::NoSpeaker | TurnResolution::Failed => ConversationStatus::Idle,
            TurnResolution::Replied { .. } if mode == SessionMode::Direct => {
                self.consecutive_bot_turns = 0;
                ConversationStatus::Idle
            }
            TurnResolution::Replied { nudged, interview } => {
                if nudged {
                    self.consecutive_bot_turns = 0;
                } else {
                    self.consecutive_bot_turns += 1;
                }
                if interview {
                    self.consecutive_bot_turns = 0;
                    ConversationStatus::Idle
                } else if !paused_mid_turn && self.consecutive_bot_turns >= self.safety_valve_cap {
                    tripped = true;
                    ConversationStatus::Paused
                } else {
                    ConversationStatus::Active
                }
            }
        };
        self.status = if paused_mid_turn {
            ConversationStatus::Paused
        } else {
            next
        };

        TurnTransition {
            status: self.status,
            safety_valve_tripped: tripped,
        }
    }
}
