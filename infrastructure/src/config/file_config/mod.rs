//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application parameters.

mod generation;
mod logging;
mod orchestrator;
mod participants;
mod repl;
mod storage;

pub use generation::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, FileGenerationConfig};
pub use logging::FileLoggingConfig;
pub use orchestrator::FileOrchestratorConfig;
pub use participants::FileParticipantConfig;
pub use repl::FileReplConfig;
pub use storage::FileStorageConfig;

use agora_application::{GenerationParams, OrchestratorParams};
use agora_domain::participant::presets::default_participants;
use agora_domain::{ParticipantId, ParticipantRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("orchestrator.retry_max_attempts cannot be 0")]
    ZeroRetryAttempts,

    #[error("orchestrator.safety_valve_cap cannot be 0")]
    ZeroSafetyValveCap,

    #[error("generation.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("generation.model cannot be empty")]
    EmptyModelName,

    #[error("participant id cannot be empty")]
    EmptyParticipantId,

    #[error("participant id '{0}' is reserved")]
    ReservedParticipantId(String),

    #[error("participant id '{0}' is defined more than once")]
    DuplicateParticipantId(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub orchestrator: FileOrchestratorConfig,
    pub generation: FileGenerationConfig,
    pub storage: FileStorageConfig,
    pub logging: FileLoggingConfig,
    pub repl: FileReplConfig,
    /// Extra personas; an entry with a preset's id replaces that preset
    pub participants: Vec<FileParticipantConfig>,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.orchestrator.retry_max_attempts == 0 {
            return Err(ConfigValidationError::ZeroRetryAttempts);
        }
        if self.orchestrator.safety_valve_cap == 0 {
            return Err(ConfigValidationError::ZeroSafetyValveCap);
        }
        if let Some(0) = self.generation.timeout_seconds {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.generation.model.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }

        let mut seen = HashSet::new();
        for participant in &self.participants {
            let id = participant.id.trim();
            if id.is_empty() {
                return Err(ConfigValidationError::EmptyParticipantId);
            }
            if !ParticipantId::from(id).is_persona() {
                return Err(ConfigValidationError::ReservedParticipantId(id.to_string()));
            }
            if !seen.insert(id) {
                return Err(ConfigValidationError::DuplicateParticipantId(id.to_string()));
            }
        }
        Ok(())
    }

    pub fn orchestrator_params(&self) -> OrchestratorParams {
        self.orchestrator.to_params()
    }

    pub fn generation_params(&self) -> GenerationParams {
        self.generation.to_params(
            self.orchestrator.reply_history_window,
            self.orchestrator.router_history_window,
        )
    }

    /// Built-in personas overlaid with configured ones
    pub fn participant_registry(&self) -> ParticipantRegistry {
        let mut registry = ParticipantRegistry::from_participants(default_participants());
        for participant in &self.participants {
            registry.insert(participant.to_participant());
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[orchestrator]
safety_valve_cap = 4
turn_delay_ms = 500
summary_interval = 0

[generation]
base_url = "http://localhost:11434/v1"
model = "llama3"
temperature = 0.3
timeout_seconds = 30

[storage]
local_dir = "/tmp/agora/cache"
remote_dir = "/mnt/shared/agora"

[logging]
conversation_log = true

[[participants]]
id = "sage"
name = "Sage"
role = "Philosopher"
instruction = "Ask why twice."
color = "magenta"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        let params = config.orchestrator_params();
        assert_eq!(params.safety_valve_cap, 4);
        assert_eq!(params.turn_delay, Duration::from_millis(500));
        assert_eq!(params.summary_interval, 0);
        assert_eq!(params.retry_max_attempts, 3);

        let generation = config.generation_params();
        assert_eq!(generation.temperature, 0.3);
        assert_eq!(generation.timeout, Some(Duration::from_secs(30)));
        assert_eq!(generation.reply_history_window, 15);

        assert_eq!(config.generation.model, "llama3");
        assert!(config.storage.remote_dir.is_some());
        assert!(config.logging.conversation_log);

        let registry = config.participant_registry();
        let sage = registry.get("sage").unwrap();
        assert_eq!(sage.role, "Philosopher");
        assert_eq!(sage.color.as_deref(), Some("magenta"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.generation.base_url, DEFAULT_BASE_URL);
        assert!(config.storage.remote_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_configured_participant_overrides_preset() {
        let defaults = FileConfig::default().participant_registry();
        let preset = defaults.all()[0].clone();

        let config = FileConfig {
            participants: vec![FileParticipantConfig {
                id: preset.id.to_string(),
                name: "Renamed".to_string(),
                role: preset.role.clone(),
                instruction: "New instruction".to_string(),
                color: None,
            }],
            ..Default::default()
        };

        let registry = config.participant_registry();
        assert_eq!(registry.len(), defaults.len());
        assert_eq!(registry.get(preset.id.as_str()).unwrap().name, "Renamed");
    }

    #[test]
    fn test_validate_zero_retry_attempts() {
        let config: FileConfig = toml::from_str("[orchestrator]\nretry_max_attempts = 0").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroRetryAttempts)
        );
    }

    #[test]
    fn test_validate_zero_safety_valve_cap() {
        let config: FileConfig = toml::from_str("[orchestrator]\nsafety_valve_cap = 0").unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroSafetyValveCap)
        );
    }

    #[test]
    fn test_validate_invalid_timeout() {
        let config: FileConfig = toml::from_str("[generation]\ntimeout_seconds = 0").unwrap();
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidTimeout));
    }

    #[test]
    fn test_validate_participant_ids() {
        let toml_str = r#"
[[participants]]
id = "  "
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::EmptyParticipantId)
        );

        let toml_str = r#"
[[participants]]
id = "user"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::ReservedParticipantId(_))
        ));

        let toml_str = r#"
[[participants]]
id = "sage"

[[participants]]
id = "sage"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::DuplicateParticipantId("sage".to_string()))
        );
    }
}
