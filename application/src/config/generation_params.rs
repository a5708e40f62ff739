//! Generation parameters: what each generation call sees.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// History windows and sampling settings for generation calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Most recent messages included in a persona reply prompt.
    pub reply_history_window: usize,
    /// Most recent messages included in a router prompt.
    pub router_history_window: usize,
    /// Most recent messages used to refresh the session context.
    pub context_history_window: usize,
    /// Sampling temperature for persona replies.
    pub temperature: f32,
    /// Maximum time to wait for a single generation call.
    pub timeout: Option<Duration>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            reply_history_window: 15,
            router_history_window: 10,
            context_history_window: 20,
            temperature: 0.7,
            timeout: Some(Duration::from_secs(120)),
        }
    }
}

impl GenerationParams {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: Option<u64>) -> Self {
        self.timeout = seconds.map(Duration::from_secs);
        self
    }
}
