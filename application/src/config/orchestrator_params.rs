//! Orchestrator parameters: turn loop control.
//!
//! [`OrchestratorParams`] groups the thresholds that govern the autonomous
//! loop: how long to wait between turns, when the safety valve trips, when
//! a phase may advance and how generation failures are retried.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Turn loop control parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorParams {
    /// Persona replies required in a phase before an automatic advance.
    pub min_turns_before_phase_advance: usize,
    /// Consecutive bot turns without human input before the loop pauses.
    pub safety_valve_cap: usize,
    /// Total generation attempts per turn (first try included).
    pub retry_max_attempts: u32,
    /// Backoff before the second attempt; doubles on each further attempt.
    pub retry_base_delay: Duration,
    /// Delay before a turn that follows a human message.
    pub human_reply_delay: Duration,
    /// Delay before a turn that follows a persona message.
    pub turn_delay: Duration,
    /// Messages between background summaries (0 disables them).
    pub summary_interval: usize,
}

impl Default for OrchestratorParams {
    fn default() -> Self {
        Self {
            min_turns_before_phase_advance: 6,
            safety_valve_cap: 6,
            retry_max_attempts: 3,
            retry_base_delay: Duration::from_millis(1000),
            human_reply_delay: Duration::from_millis(1000),
            turn_delay: Duration::from_millis(2500),
            summary_interval: 20,
        }
    }
}

impl OrchestratorParams {
    /// Backoff to wait after failed attempt number `attempt` (1-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.retry_base_delay.saturating_mul(1u32 << exponent)
    }

    /// Delay before the next turn, depending on who spoke last.
    pub fn turn_delay_after(&self, last_was_human: bool) -> Duration {
        if last_was_human {
            self.human_reply_delay
        } else {
            self.turn_delay
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_min_turns_before_phase_advance(mut self, turns: usize) -> Self {
        self.min_turns_before_phase_advance = turns;
        self
    }

    pub fn with_safety_valve_cap(mut self, cap: usize) -> Self {
        self.safety_valve_cap = cap;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.retry_max_attempts = max_attempts;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_delays(mut self, human_reply: Duration, turn: Duration) -> Self {
        self.human_reply_delay = human_reply;
        self.turn_delay = turn;
        self
    }

    pub fn with_summary_interval(mut self, interval: usize) -> Self {
        self.summary_interval = interval;
        self
    }
}
