//! Turn loop configuration from TOML (`[orchestrator]` section)

use agora_application::OrchestratorParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw orchestrator configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    /// Persona replies in a phase before the router may advance it
    pub min_turns_before_phase_advance: usize,
    /// Consecutive persona turns before the loop pauses itself
    pub safety_valve_cap: usize,
    /// Generation attempts per turn, first try included
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub human_reply_delay_ms: u64,
    pub turn_delay_ms: u64,
    /// Messages in a persona reply prompt
    pub reply_history_window: usize,
    /// Messages in a router prompt
    pub router_history_window: usize,
    /// Messages between background summaries (0 disables them)
    pub summary_interval: usize,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        Self {
            min_turns_before_phase_advance: 6,
            safety_valve_cap: 6,
            retry_max_attempts: 3,
            retry_base_delay_ms: 1000,
            human_reply_delay_ms: 1000,
            turn_delay_ms: 2500,
            reply_history_window: 15,
            router_history_window: 10,
            summary_interval: 20,
        }
    }
}

impl FileOrchestratorConfig {
    pub fn to_params(&self) -> OrchestratorParams {
        OrchestratorParams::default()
            .with_min_turns_before_phase_advance(self.min_turns_before_phase_advance)
            .with_safety_valve_cap(self.safety_valve_cap)
            .with_retry(
                self.retry_max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            )
            .with_delays(
                Duration::from_millis(self.human_reply_delay_ms),
                Duration::from_millis(self.turn_delay_ms),
            )
            .with_summary_interval(self.summary_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_params() {
        assert_eq!(
            FileOrchestratorConfig::default().to_params(),
            OrchestratorParams::default()
        );
    }

    #[test]
    fn test_to_params_converts_milliseconds() {
        let config = FileOrchestratorConfig {
            retry_base_delay_ms: 250,
            turn_delay_ms: 0,
            ..Default::default()
        };
        let params = config.to_params();
        assert_eq!(params.retry_base_delay, Duration::from_millis(250));
        assert_eq!(params.turn_delay, Duration::ZERO);
    }
}
