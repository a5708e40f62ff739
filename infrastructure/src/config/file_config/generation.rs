//! Provider configuration from TOML (`[generation]` section)

use agora_application::GenerationParams;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "AGORA_API_KEY";

/// Raw generation configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    /// OpenAI-compatible API root (without `/chat/completions`)
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    /// Per-call timeout; `None` waits indefinitely
    pub timeout_seconds: Option<u64>,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.7,
            timeout_seconds: Some(120),
        }
    }
}

impl FileGenerationConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn to_params(&self, reply_window: usize, router_window: usize) -> GenerationParams {
        let mut params = GenerationParams::default()
            .with_temperature(self.temperature)
            .with_timeout_seconds(self.timeout_seconds);
        params.reply_history_window = reply_window;
        params.router_history_window = router_window;
        params
    }
}
